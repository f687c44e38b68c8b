use clap::Subcommand;
use sanctuaire_core::Database;

#[derive(Subcommand)]
pub enum JournalAction {
    /// Write a journal entry
    Add {
        /// Entry text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List entries, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry
    Delete {
        /// Entry id
        id: i64,
    },
}

pub fn run(action: JournalAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        JournalAction::Add { text } => {
            let entry = db.add_journal_entry(&text.join(" "))?;
            println!("Entry saved: {}", entry.id);
        }
        JournalAction::List { json } => {
            let entries = db.journal_entries()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No entries.");
            } else {
                for entry in entries {
                    println!(
                        "{}  {}  {}",
                        entry.id,
                        entry.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                        entry.text
                    );
                }
            }
        }
        JournalAction::Delete { id } => {
            if db.delete_journal_entry(id)? {
                println!("Entry deleted: {id}");
            } else {
                return Err(format!("no journal entry with id {id}").into());
            }
        }
    }
    Ok(())
}
