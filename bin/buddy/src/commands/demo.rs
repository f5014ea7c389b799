use buddy_agent::runtime::NOTIFICATION_RECIPIENT;
use buddy_agent::{Assistant, ConversationContext};
use buddy_core::{AgentMessage, Config};
use buddy_providers::EventSpec;
use chrono::{Duration, Utc};

/// Walk through the specialist fan-out end to end: seed calendar events,
/// run a weather request through the fusion path, then show the full
/// situation report and the bus traffic it produced.
pub async fn run() -> anyhow::Result<()> {
    let config = Config::load_or_default();
    let city = config.agent.default_city.clone();
    let assistant = Assistant::from_config(config);

    println!("Specialist communication demo");
    println!("=============================");
    println!();

    println!("1. Seeding calendar events...");
    let calendar = assistant.calendar();
    let picnic_start = Utc::now() + Duration::hours(6);
    calendar
        .seed(EventSpec {
            title: "Team Picnic".to_string(),
            start: picnic_start,
            end: picnic_start + Duration::hours(2),
            location: "Central Park".to_string(),
            description: "Outdoor team building event in the park".to_string(),
        })
        .await;
    let jog_start = Utc::now() + Duration::hours(18);
    calendar
        .seed(EventSpec {
            title: "Morning Jog".to_string(),
            start: jog_start,
            end: jog_start + Duration::minutes(45),
            location: String::new(),
            description: "Daily exercise routine".to_string(),
        })
        .await;
    println!("   seeded 'Team Picnic' and 'Morning Jog'");
    println!();

    println!("2. Asking the assistant about the weather...");
    let mut ctx = ConversationContext::default();
    let reply = assistant
        .handle(&format!("What's the weather in {}?", city), &mut ctx)
        .await?;
    println!();
    println!("{}", reply.text);
    println!();

    if let Some(decision) = &reply.decision {
        println!(
            "3. The fuser combined {} assessments into one decision (confidence {:.0}%).",
            decision.assessments.len(),
            decision.confidence * 100.0
        );
        for assessment in &decision.assessments {
            println!(
                "   {:9} score {:.2}  findings: {}",
                assessment.source,
                assessment.score,
                assessment.findings.join("; ")
            );
        }
    }
    println!();

    println!("4. Bus traffic:");
    let bus = assistant.bus();
    bus.send(AgentMessage::query("orchestrator", "weather", "anything to flag?"))
        .await;
    let notes = bus.drain(NOTIFICATION_RECIPIENT).await;
    if notes.is_empty() {
        println!("   no conflict notifications queued");
    }
    for note in notes {
        println!("   {} -> {}: {}", note.sender, note.recipient, note.content);
    }
    if let Some(pending) = bus.receive("weather").await {
        println!("   {} -> {}: {}", pending.sender, pending.recipient, pending.content);
    }
    println!();

    println!("5. Full situation report (weather + schedule + social):");
    let report = assistant.situation_report(&city).await;
    for assessment in &report.assessments {
        println!("   {:9} score {:.2}", assessment.source, assessment.score);
    }
    println!("   recommendation: {}", report.recommendation);

    Ok(())
}
