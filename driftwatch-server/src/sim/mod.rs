//! Scripted simulation
//!
//! Replays canned incident chatter through the real post pipeline so
//! the dashboard has live data without external feeds. The scanner
//! yields scripted records, the verifier maps their scripted truth
//! status onto a verdict, and the publisher records that verdict in
//! the activity ring.

pub mod data;
pub mod publisher;
pub mod runner;
pub mod scanner;
pub mod verifier;

pub use data::{ScriptData, TruthStatus};
pub use runner::ReplayControl;
pub use scanner::Scanner;
