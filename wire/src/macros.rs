//! Public macros for building binding lists and resolving services.

/// Builds the `(Slot, Argument)` list taken by
/// [`Concrete::with_parameters`](crate::Concrete::with_parameters),
/// [`Concrete::with_properties`](crate::Concrete::with_properties) and
/// [`Concrete::with_method_call`](crate::Concrete::with_method_call).
///
/// Keys are parameter names or positions. Values are anything convertible
/// into an [`Argument`](crate::Argument): a string names a service, use
/// [`literal`](crate::literal) for verbatim values.
///
/// ```
/// use fibre_wire::{bindings, literal, Argument, Slot};
///
/// let bound = bindings!["logger" => "Logger", 1 => literal(8080_u16), "cache" => Argument::Inferred];
/// assert_eq!(bound.len(), 3);
/// assert_eq!(bound[1].0, Slot::Positional(1));
/// ```
#[macro_export]
macro_rules! bindings {
    () => {
        ::std::vec::Vec::<($crate::Slot, $crate::Argument)>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$(($crate::Slot::from($key), $crate::Argument::from($value))),+]
    };
}

/// Builds the `(Slot, Binding)` list taken by
/// [`Container::wire`](crate::Container::wire).
///
/// A bare string adds that interface bound to itself, `key => class` binds
/// the key to a class.
///
/// ```
/// use fibre_wire::{wiring, Binding, Slot};
///
/// let entries = wiring!["Logger", "Mailer" => "SmtpMailer"];
/// assert_eq!(entries[0].0, Slot::Positional(0));
/// assert!(matches!(&entries[1].1, Binding::Class(class) if class == "SmtpMailer"));
/// ```
#[macro_export]
macro_rules! wiring {
    () => {
        ::std::vec::Vec::<($crate::Slot, $crate::Binding)>::new()
    };
    ($($entry:tt)+) => {
        $crate::__wiring_entries!(@acc [] @next 0usize; $($entry)+)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wiring_entries {
    (@acc [$($done:tt)*] @next $index:expr;) => {
        ::std::vec![$($done)*]
    };
    (@acc [$($done:tt)*] @next $index:expr; $key:literal => $value:expr $(, $($rest:tt)*)?) => {
        $crate::__wiring_entries!(
            @acc [$($done)* ($crate::Slot::from($key), $crate::Binding::from($value)),]
            @next $index + 1; $($($rest)*)?
        )
    };
    (@acc [$($done:tt)*] @next $index:expr; $interface:literal $(, $($rest:tt)*)?) => {
        $crate::__wiring_entries!(
            @acc [$($done)* ($crate::Slot::Positional($index), $crate::Binding::from($interface)),]
            @next $index + 1; $($($rest)*)?
        )
    };
}

/// Resolves a service and downcasts it, panicking when either fails.
///
/// Use [`Container::get_as`](crate::Container::get_as) directly for a
/// non-panicking version.
///
/// # Panics
///
/// Panics if the interface can not be resolved or does not resolve to the
/// requested type.
///
/// ```
/// use fibre_wire::{resolve, Binding, Container};
///
/// let container = Container::new();
/// container.add_with("greeting", Binding::instance(String::from("hello")))?;
///
/// let greeting = resolve!(container, "greeting" as String);
/// assert_eq!(*greeting, "hello");
/// # Ok::<(), fibre_wire::Error>(())
/// ```
#[macro_export]
macro_rules! resolve {
    ($container:expr, $interface:literal as $type:ty) => {
        $container
            .get_as::<$type>($interface)
            .unwrap_or_else(|error| panic!("Failed to resolve required service `{}`: {}", $interface, error))
    };
}
