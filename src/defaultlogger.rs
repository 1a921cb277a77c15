use indicatif::{ProgressBar, ProgressStyle};

use crate::logging::{set_boxed_messenger, Messenger, ProgressCount};
use crate::utils::Result;

pub struct ProgressCountDefault {
    pb: ProgressBar,
}

impl ProgressCountDefault {
    pub fn new(message: &str, total: u64) -> Box<dyn ProgressCount> {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:60.cyan/blue}] {pos} / {len} tiles ({eta_precise}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(message.to_string());

        Box::new(ProgressCountDefault { pb })
    }
}

impl ProgressCount for ProgressCountDefault {
    fn change_message(&self, new_message: &str) {
        self.pb.set_message(new_message.to_string());
    }

    fn progress(&self, count: u64) {
        self.pb.set_position(count);
    }

    fn finish(&self) {
        self.pb.finish();
    }
}

pub struct MessengerDefault;

impl MessengerDefault {
    pub fn new() -> MessengerDefault {
        MessengerDefault
    }
}

impl Default for MessengerDefault {
    fn default() -> MessengerDefault {
        MessengerDefault::new()
    }
}

impl Messenger for MessengerDefault {
    fn message(&self, message: &str) {
        let lns = message.split('\n');
        for (i, l) in lns.enumerate() {
            println!("{} {}", (if i == 0 { "MSG:" } else { "    " }), l);
        }
    }

    fn start_progress_count(&self, message: &str, total: u64) -> Box<dyn ProgressCount> {
        ProgressCountDefault::new(message, total)
    }
}

pub fn register_messenger_default() -> Result<()> {
    let msg = Box::new(MessengerDefault::new());
    set_boxed_messenger(msg)?;
    Ok(())
}
