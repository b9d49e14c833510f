use tracing::{debug, warn};

use super::{InterviewView, PageUpdate};

/// Renders the interview page as terminal lines
#[derive(Debug, Default)]
pub struct ConsoleView;

impl ConsoleView {
    pub fn new() -> Self {
        Self
    }
}

impl InterviewView for ConsoleView {
    fn render(&self, update: PageUpdate) {
        match update {
            PageUpdate::QuestionText(text) => println!("\n{}", text),
            PageUpdate::Progress(percent) => println!("[progress {:.0}%]", percent),
            PageUpdate::Timer(secs) => {
                print!("\rRecording: {}s", secs);
                std::io::Write::flush(&mut std::io::stdout()).ok();
            }
            PageUpdate::Recording(true) => println!("● Stop Recording"),
            PageUpdate::Recording(false) => println!("\n○ Speak Your Answer"),
            PageUpdate::Transcript(text) | PageUpdate::Feedback(text) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            PageUpdate::Celebrate => println!("*** Perfect score! ***"),
            PageUpdate::NextEnabled(enabled) => debug!("Next question enabled: {}", enabled),
            PageUpdate::Notice(notice) => {
                warn!("Notice: {}", notice);
                println!("\n[!] {}", notice);
            }
        }
    }
}
