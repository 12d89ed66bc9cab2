#[macro_export]
macro_rules! make_smart_pointer {
    ($name:ident, $target:ty) => {
        impl std::ops::Deref for $name {
            type Target = $target;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}

#[macro_export]
macro_rules! from_to {
    ($from:ty, $to:ty) => {
        impl From<$from> for $to {
            fn from(value: $from) -> Self {
                Self(value)
            }
        }
        impl From<$to> for $from {
            fn from(value: $to) -> Self {
                value.0
            }
        }
    };
}

/// Declares one local per setting, seeded with its default, then overrides it
/// from `--name value` pairs on the command line.
#[macro_export]
macro_rules! env_var {
    (
        defaults: {
            $($name:ident : $type:ty = $default:expr),* $(,)?
        }
    ) => {
        $(
            let mut $name: $type = $default;
        )*

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                $(
                    concat!("--", stringify!($name)) => {
                        if let Some(val) = args.next() {
                            match val.parse::<$type>() {
                                | Ok(parsed) => $name = parsed,
                                | Err(_) => eprintln!(
                                    "Invalid value {:?} for --{}, keeping default",
                                    val,
                                    stringify!($name)
                                ),
                            }
                        }
                    }
                )*
                _ => eprintln!("Unexpected argument: {}", arg),
            }
        }
    };
}
