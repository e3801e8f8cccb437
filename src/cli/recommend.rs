use crate::chats::Chats;
use crate::config::HavenConfig;
use crate::resources;

/// Run the recommend command
pub fn run_recommend(feeling: &str, limit: usize, json: bool) -> Result<(), String> {
    let chats = Chats::open().map_err(|e| e.to_string())?;

    let recs = match chats.recommend(feeling, limit) {
        Ok(recs) => recs,
        Err(e) => {
            // Failures here never surface raw errors to the user
            tracing::warn!(error = %e, "recommendation failed");
            println!("Could not generate a recommendation right now. Please try again.");
            return Ok(());
        }
    };

    if json {
        let out = serde_json::to_string_pretty(&recs)
            .map_err(|e| format!("Failed to serialize: {}", e))?;
        println!("{}", out);
        return Ok(());
    }

    if recs.is_empty() {
        println!("Nothing to recommend.");
        return Ok(());
    }

    if recs.iter().all(|r| r.score == 0.0) {
        println!("No close match for how you're feeling - some general suggestions:\n");
    } else {
        println!("Based on how you're feeling, here are some activities that might help:\n");
    }

    for (i, rec) in recs.iter().enumerate() {
        println!("{}. {}", i + 1, rec.tip);
        println!("   mood: {}  (score: {:.3})", rec.label, rec.score);
    }

    Ok(())
}

/// Run the corpus command - show the loaded recommendation corpus
pub fn run_corpus() -> Result<(), String> {
    let chats = Chats::open().map_err(|e| e.to_string())?;
    let matcher = chats.matcher();

    println!(
        "Corpus: {} entries, strategy: {}\n",
        matcher.corpus().len(),
        matcher.strategy()
    );

    for (i, entry) in matcher.corpus().iter().enumerate() {
        println!("[{:3}] {:12} {}", i, entry.label, entry.tip);
    }

    Ok(())
}

/// Run the resources command
pub fn run_resources(mood: Option<&str>) -> Result<(), String> {
    let endpoint = crate::config::find_haven_path()
        .map(HavenConfig::new)
        .and_then(|c| c.resources_endpoint());

    let resources = resources::lookup(endpoint.as_deref(), mood.unwrap_or("general"));

    println!("Verified mental health resources:\n");
    for r in resources {
        println!("  {}", r.title);
        println!("    {}", r.url);
    }

    Ok(())
}
