mod init;
mod tests;

pub use init::LoggerBuilder;
pub use tests::for_tests;

pub mod prelude {
    pub use slog_scope::{crit, debug, error, info, trace, warn};

    pub use slog::{self, b, o, Drain as SlogDrain, FnValue, Key, Level, Record, Serializer};

    pub use slog_scope::{self, logger};
}

#[macro_export]
macro_rules! slog_value_debug {
    ($ty:ident) => {
        impl $crate::prelude::slog::Value for $ty {
            fn serialize(
                &self,
                _: &$crate::prelude::slog::Record,
                key: $crate::prelude::slog::Key,
                serializer: &mut dyn $crate::prelude::slog::Serializer,
            ) -> $crate::prelude::slog::Result<()> {
                serializer.emit_arguments(key, &format_args!("{:?}", self))
            }
        }
    };
}
