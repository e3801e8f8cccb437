use crate::chats::Chats;

/// Run the stats command
pub fn run_stats(days: Option<u32>) -> Result<(), String> {
    let chats = Chats::open().map_err(|e| e.to_string())?;
    let stats = chats.stats(days).map_err(|e| e.to_string())?;

    println!("Usage Statistics");
    println!("================\n");

    if let Some(d) = days {
        println!("Window:             last {} days", d);
    }
    println!("Total chats:        {}", stats.total_chats);
    println!("Total messages:     {}", stats.total_messages);
    println!("  from you:         {}", stats.user_messages);
    println!("  from haven:       {}", stats.assistant_messages);
    println!("Recommendations:    {}", stats.recommendations_served);
    println!("Avg msgs per chat:  {:.1}", stats.avg_messages_per_chat);

    if !stats.daily_activity.is_empty() {
        println!("\nDaily activity:");
        for (day, count) in &stats.daily_activity {
            println!("  {}  {}", day, count);
        }
    }

    Ok(())
}
