use std::path::PathBuf;

use clap::Subcommand;
use flagquiz_core::{Config, Question, QuestionBank};

use super::playable_bank;

#[derive(Subcommand)]
pub enum QuestionsAction {
    /// List the configured questions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a question file without installing it
    Validate {
        /// Path to a questions JSON file
        path: PathBuf,
    },
}

pub fn run(action: QuestionsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        QuestionsAction::List { json } => {
            let config = Config::load_or_default();
            let bank = playable_bank(&config)?;
            if json {
                let questions: Vec<&Question> = bank.iter().collect();
                println!("{}", serde_json::to_string_pretty(&questions)?);
            } else {
                for (index, question) in bank.iter().enumerate() {
                    let answer = question
                        .correct_country()
                        .map(|c| c.country_name.as_str())
                        .unwrap_or("?");
                    println!(
                        "{:>3}  {:<4} {} ({} choices)",
                        index + 1,
                        question.country_code,
                        answer,
                        question.countries.len()
                    );
                }
            }
        }
        QuestionsAction::Validate { path } => {
            let bank = QuestionBank::load(&path)?;
            println!("ok: {} questions", bank.len());
        }
    }
    Ok(())
}
