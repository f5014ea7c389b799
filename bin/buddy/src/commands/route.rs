use buddy_agent::{ConversationContext, IntentRouter};

pub async fn run(text: &str) -> anyhow::Result<()> {
    let router = IntentRouter::new();
    let intent = router.route(text, &ConversationContext::default());
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}
