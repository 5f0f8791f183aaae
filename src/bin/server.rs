//! Chatbot server binary.
//! Run with: cargo run --bin chatbot-server

use std::process::ExitCode;

use feedback_chatbot::start_chatbot;

fn main() -> ExitCode {
    start_chatbot::run()
}
