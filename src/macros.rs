/// Path of the enclosing function, resolved at compile time.
///
/// Closures report the function they are defined in.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.trim_end_matches("::{{closure}}")
    }};
}

/// A [`Stacktrace`](crate::Stacktrace) for the line the macro is expanded
/// on, with the function name filled in without a backtrace.
#[macro_export]
macro_rules! here {
    () => {
        $crate::Stacktrace::new(
            $crate::function_name!(),
            $crate::stacktrace::normalize_path(file!(), &$crate::config::get().source_roots),
            line!(),
        )
    };
}

/// Builds a [`StructuredError`](crate::StructuredError) of the given kind
/// with a formatted message and a compile-time call site.
///
/// ```ignore
/// let err = structured_error!(Kind::NotFound, "user {id} missing");
/// ```
#[macro_export]
macro_rules! structured_error {
    ($kind:expr, $($arg:tt)+) => {
        $crate::StructuredError::from_kind_at($kind, format!($($arg)+), $crate::here!())
    };
}
