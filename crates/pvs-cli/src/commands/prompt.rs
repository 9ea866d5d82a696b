//! Terminal prompt for `sync --interactive`.
//!
//! Questions go to stderr so stdout stays clean for `--json`.

use std::io::{self, BufRead, Write};

use chrono::TimeZone;
use chrono_tz::Tz;
use pvs_reconcile::{Decision, Prompt, Record};

pub struct StdinPrompt {
    tz: Tz,
}

impl StdinPrompt {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    fn describe(&self, record: &Record) -> String {
        let when = match self.tz.timestamp_opt(record.timestamp(), 0).single() {
            Some(t) => t.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
            None => record.timestamp().to_string(),
        };
        let fields: Vec<String> = record
            .fields()
            .map(|(f, v)| format!("{}={v}", f.key()))
            .collect();
        format!("{when}  {}", fields.join(" "))
    }
}

/// `y` accept, `n` skip, `a` accept this and all remaining, `q` quit.
pub fn parse_answer(line: &str) -> Option<Decision> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Decision::Accept),
        "n" | "no" => Some(Decision::Skip),
        "a" | "all" => Some(Decision::AcceptAll),
        "q" | "quit" => Some(Decision::Quit),
        _ => None,
    }
}

impl Prompt for StdinPrompt {
    fn ask(&mut self, record: &Record) -> Decision {
        let mut stderr = io::stderr();
        let _ = writeln!(stderr, "{}", self.describe(record));
        loop {
            let _ = write!(stderr, "publish? [y]es/[n]o/[a]ll/[q]uit: ");
            let _ = stderr.flush();

            let mut line = String::new();
            // Blocking read on the runtime worker; the run is the only task.
            let read = tokio::task::block_in_place(|| io::stdin().lock().read_line(&mut line));
            match read {
                // EOF or a broken terminal: stop asking.
                Ok(0) | Err(_) => return Decision::Quit,
                Ok(_) => {}
            }
            if let Some(d) = parse_answer(&line) {
                return d;
            }
        }
    }
}
