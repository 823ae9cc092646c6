mod console;

pub use console::{Command, ConsoleRenderer};
