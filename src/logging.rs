use std::sync::OnceLock;

use crate::utils::{Error, Result};

static MESSENGER: OnceLock<Box<dyn Messenger>> = OnceLock::new();

pub fn set_boxed_messenger(logger: Box<dyn Messenger>) -> Result<()> {
    MESSENGER
        .set(logger)
        .map_err(|_| Error::InvalidInputError(String::from("failed to set messenger")))
}

pub fn messenger() -> &'static dyn Messenger {
    match MESSENGER.get() {
        Some(m) => m.as_ref(),
        None => {
            static NOP: NopMessenger = NopMessenger;
            &NOP
        }
    }
}

#[macro_export]
macro_rules! message {
    ($($arg:tt)*) => {
        $crate::logging::messenger().message(&format!($($arg)*))
    };
}

pub trait ProgressCount {
    fn change_message(&self, new_message: &str);
    fn progress(&self, count: u64);
    fn finish(&self);
}

pub trait Messenger: Sync + Send {
    fn message(&self, message: &str);

    fn start_progress_count(&self, message: &str, total: u64) -> Box<dyn ProgressCount>;
}

struct NopProgress;
impl ProgressCount for NopProgress {
    fn change_message(&self, _new_message: &str) {}
    fn progress(&self, _count: u64) {}
    fn finish(&self) {}
}

struct NopMessenger;
impl Messenger for NopMessenger {
    fn message(&self, _message: &str) {}

    fn start_progress_count(&self, _message: &str, _total: u64) -> Box<dyn ProgressCount> {
        Box::new(NopProgress)
    }
}
