pub mod report;
pub mod scan;
pub mod wordlist;

pub use report::{ReportFormat, generate_summary, save_report};
pub use scan::{ConsoleObserver, ScanOptions, execute_scan};
pub use wordlist::{load_user_agents, load_wordlist};
