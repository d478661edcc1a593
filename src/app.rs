use crate::scheduler::Scheduler;
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub const EXAMPLE_REQUESTS: &[&str] = &[
    "Set a sync call with Sarah tomorrow at 5pm",
    "Set a 1:1 with Viv next Tuesday at 9:30am",
    "Set a demo with Amy at 2pm",
    "Set a meeting with Raj on Monday at 3pm",
];

/// What the loop should do with one line of input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Blank,
    Exit,
    Request(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Blank
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Exit
    } else {
        Input::Request(line)
    }
}

pub struct Application {
    scheduler: Scheduler,
}

impl Application {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Schedule a single request and print the outcome
    pub async fn run_once(&self, request: &str) {
        println!("{}", self.scheduler.schedule(request).await);
    }

    pub async fn run(&self) -> Result<()> {
        log::info!("Starting MeetSched interactive mode");
        let mut rl = DefaultEditor::new()?;

        println!("Welcome to MeetSched! Describe a meeting and I'll put it on your calendar.");
        if self.scheduler.is_simulating() {
            println!("(No calendar token found; meetings will be simulated.)");
        }
        println!("Try:");
        for example in EXAMPLE_REQUESTS {
            println!("  {}", example);
        }
        println!("Type 'exit' or 'quit' to leave.");

        loop {
            match rl.readline("You: ") {
                Ok(line) => match classify(&line) {
                    Input::Blank => continue,
                    Input::Exit => {
                        println!("Goodbye!");
                        break;
                    }
                    Input::Request(request) => {
                        let _ = rl.add_history_entry(request);
                        self.run_once(request).await;
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        Ok(())
    }
}
