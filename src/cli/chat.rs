use crate::chats::Chats;
use crate::types::{ChatMessage, Role};
use std::io::{self, Write};
use std::path::Path;

/// Run the init command
pub fn run_init(path: &str) -> Result<(), String> {
    let path = Path::new(path);
    let haven_path = path.join(".haven");

    if haven_path.exists() {
        return Err(format!(".haven already exists at {}", haven_path.display()));
    }

    let chats = Chats::init(path).map_err(|e| e.to_string())?;
    println!("Initialized .haven at {}", chats.haven_path().display());

    Ok(())
}

/// Run the chat command - interactive support conversation
pub fn run_chat(chat_id: Option<&str>) -> Result<(), String> {
    let chats = Chats::open().map_err(|e| e.to_string())?;

    let chat_id = match chat_id {
        Some(id) => {
            if !chats.chat_exists(id).map_err(|e| e.to_string())? {
                return Err(format!("Chat not found: {}", id));
            }
            id.to_string()
        }
        None => chats.create_chat().map_err(|e| e.to_string())?,
    };

    println!("{}", "=".repeat(50));
    println!("Welcome to the mental health support chat.");
    println!("I'm here to listen and suggest things that might help.");
    if !chats.online() {
        println!("(offline mode - set HAVEN_API_KEY for conversational replies)");
    }
    println!("Type 'exit' to end the conversation.");
    println!("{}", "=".repeat(50));

    // Replay previous turns when resuming a chat
    let history = chats.history(&chat_id).map_err(|e| e.to_string())?;
    for m in &history {
        print_message(m);
    }

    loop {
        print!("\nyou> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input).map_err(|e| e.to_string())? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            println!("Please share how you're feeling.");
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }

        match chats.respond(&chat_id, input) {
            Ok(reply) => println!("\nhaven> {}", reply),
            Err(e) => {
                tracing::warn!(error = %e, "reply failed");
                println!("\nhaven> I ran into a problem replying. Let's try that again.");
            }
        }
    }

    println!("\nTake care. Remember, you're not alone.");
    println!("Chat saved as [{}]", chat_id);

    Ok(())
}

/// Run the history command
pub fn run_history(chat_id: Option<&str>, limit: usize) -> Result<(), String> {
    let chats = Chats::open().map_err(|e| e.to_string())?;

    if let Some(id) = chat_id {
        let history = chats.history(id).map_err(|e| e.to_string())?;

        if history.is_empty() {
            println!("No messages in chat {}.", id);
            return Ok(());
        }

        for m in history {
            print_message(&m);
        }
    } else {
        let summaries = chats.list_chats(limit).map_err(|e| e.to_string())?;

        if summaries.is_empty() {
            println!("No chats yet. Start one with: haven chat");
            return Ok(());
        }

        println!("Recent chats:\n");
        for s in summaries {
            println!(
                "[{}] {} messages, last active {}",
                s.id, s.message_count, s.updated_at
            );
        }
    }

    Ok(())
}

/// Run the delete command
pub fn run_delete(chat_id: &str, force: bool) -> Result<(), String> {
    let chats = Chats::open().map_err(|e| e.to_string())?;

    if !chats.chat_exists(chat_id).map_err(|e| e.to_string())? {
        return Err(format!("Chat not found: {}", chat_id));
    }

    if !force {
        print!("Delete chat [{}] and all its messages? [y/N] ", chat_id);
        io::stdout().flush().map_err(|e| e.to_string())?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).map_err(|e| e.to_string())?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    chats.delete_chat(chat_id).map_err(|e| e.to_string())?;
    println!("Deleted [{}]", chat_id);

    Ok(())
}

/// Run the export command
pub fn run_export(format: &str) -> Result<(), String> {
    let chats = Chats::open().map_err(|e| e.to_string())?;
    let summaries = chats.list_chats(10000).map_err(|e| e.to_string())?;

    match format {
        "json" => {
            let mut out = Vec::new();
            for s in &summaries {
                let history = chats.history(&s.id).map_err(|e| e.to_string())?;
                out.push(serde_json::json!({
                    "id": s.id,
                    "created_at": s.created_at,
                    "updated_at": s.updated_at,
                    "messages": history,
                }));
            }
            let json = serde_json::to_string_pretty(&out)
                .map_err(|e| format!("Failed to serialize: {}", e))?;
            println!("{}", json);
        }
        "md" => {
            for s in &summaries {
                println!("## Chat {} ({})\n", s.id, &s.created_at[..10.min(s.created_at.len())]);
                let history = chats.history(&s.id).map_err(|e| e.to_string())?;
                for m in history {
                    println!("**{}** ({})\n", m.role.as_str(), m.timestamp);
                    println!("{}\n", m.content);
                }
                println!("---\n");
            }
        }
        _ => {
            return Err(format!("Unknown format: {}", format));
        }
    }

    Ok(())
}

// Helper to print a chat message
fn print_message(m: &ChatMessage) {
    let speaker = match m.role {
        Role::User => "you",
        Role::Assistant => "haven",
    };
    println!("\n{}> {}", speaker, m.content);
}
