use buddy_agent::{Assistant, ConversationContext};
use buddy_core::Config;
use std::io::{self, BufRead, Write};

pub async fn run(message: Option<String>) -> anyhow::Result<()> {
    let config = Config::load_or_default();
    let name = config.agent.name.clone();
    let history_limit = config.agent.history_limit;
    let assistant = Assistant::from_config(config);
    let mut ctx = ConversationContext::new(history_limit);

    if let Some(message) = message {
        let reply = assistant.handle(&message, &mut ctx).await?;
        println!("{}", reply.text);
        return Ok(());
    }

    println!("Chat with {} (type 'quit' to exit)", name);
    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "quit" | "exit" | "bye") {
            println!("{}: Goodbye!", name);
            break;
        }

        match assistant.handle(line, &mut ctx).await {
            Ok(reply) => println!("{}: {}", name, reply.text),
            Err(e) => println!("{}: request failed: {}", name, e),
        }

        // surface any queued notifications (conflict alerts etc.)
        for note in assistant.bus().drain(buddy_agent::runtime::NOTIFICATION_RECIPIENT).await {
            println!("[notification] {}", note.content);
        }
    }

    Ok(())
}
