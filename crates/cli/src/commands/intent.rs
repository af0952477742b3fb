//! Intent debugging — show every classifier match for an utterance.

use anyhow::Result;
use vesper_nlu::IntentClassifier;

pub fn run(text: &str) -> Result<()> {
    let classifier = IntentClassifier::new();
    let matches = classifier.parse_all(text);

    if matches.is_empty() {
        let fallback = classifier.parse(text);
        println!("{}", serde_json::to_string_pretty(&fallback)?);
        return Ok(());
    }

    for intent in &matches {
        println!("{}", serde_json::to_string_pretty(intent)?);
    }
    println!(
        "\nactionable: {}",
        if classifier.is_actionable(text) { "yes" } else { "no" }
    );
    Ok(())
}
