pub mod banner;
pub mod progress;

pub use progress::ConsoleProgress;

/// Prints the welcome banner. Call once when the server starts.
pub fn init_ui() {
    banner::print_welcome();
}
