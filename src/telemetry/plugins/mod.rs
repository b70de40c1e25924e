pub mod console;

pub use console::ConsoleExporter;
