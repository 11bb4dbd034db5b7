use anyhow::Context;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};

use roundtable::api::RemoteOrchestrator;
use roundtable::config::AppConfig;
use roundtable::persona::PersonaRegistry;
use roundtable::topic::PREDEFINED_TOPICS;
use roundtable::{Conversation, Turn, TurnSource};

use super::build_orchestrator;

const HELP: &str = "Enter: next turn, text: speak, /reset: new topic, /quit: leave";

enum Input {
    Next,
    Say(String),
    Reset,
    Quit,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" => Input::Next,
        "/quit" | "/exit" => Input::Quit,
        "/reset" | "/topic" => Input::Reset,
        text => Input::Say(text.to_string()),
    }
}

/// Resolves a menu answer to a topic: a 1-based index or free text.
fn pick_topic(answer: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=PREDEFINED_TOPICS.len()).contains(&n) => {
            Some(PREDEFINED_TOPICS[n - 1].to_string())
        }
        _ => Some(answer.to_string()),
    }
}

pub async fn run(
    config: &AppConfig,
    remote: Option<String>,
    topic: Option<String>,
) -> anyhow::Result<()> {
    let personas = config.personas()?;
    let source: Box<dyn TurnSource> = match remote {
        Some(url) => {
            log::info!("playing against {url}");
            Box::new(RemoteOrchestrator::new(&url, personas.clone())?)
        }
        None => Box::new(build_orchestrator(config)?),
    };
    let validator = config.topic_validator()?;
    let mut conversation = Conversation::with_window_size(config.dialogue.window_size);
    let mut lines = BufReader::new(stdin()).lines();

    let mut pending = topic;
    loop {
        if conversation.topic().is_none() {
            let answer = match pending.take() {
                Some(topic) => topic,
                None => match ask_topic(&mut lines).await? {
                    Some(answer) => answer,
                    None => return Ok(()),
                },
            };
            let Some(topic) = pick_topic(&answer) else {
                continue;
            };
            match conversation.select_topic(&validator, &topic) {
                Ok(seed) => {
                    print_turn(seed, &personas);
                    println!("{HELP}");
                }
                Err(err) => println!("Invalid topic: {err}"),
            }
            continue;
        }

        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            return Ok(());
        };
        let turn = match parse_input(&line) {
            Input::Quit => return Ok(()),
            Input::Reset => {
                conversation.reset();
                continue;
            }
            Input::Next => conversation.advance(&*source).await?,
            Input::Say(text) => conversation.intervene(&text, &*source).await?,
        };
        print_turn(turn, &personas);
    }
}

async fn ask_topic(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<String>> {
    println!("Pick a topic by number, or type your own:");
    for (i, topic) in PREDEFINED_TOPICS.iter().enumerate() {
        println!("  {}. {topic}", i + 1);
    }
    Ok(lines.next_line().await.context("reading stdin")?)
}

fn print_turn(turn: &Turn, personas: &PersonaRegistry) {
    println!("[{}] {}", turn.speaker().label(personas), turn.text());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_answer_accepts_index_or_text() {
        assert_eq!(pick_topic("1").as_deref(), Some(PREDEFINED_TOPICS[0]));
        assert_eq!(pick_topic(" Tea ceremonies ").as_deref(), Some("Tea ceremonies"));
        assert_eq!(pick_topic("99").as_deref(), Some("99"));
        assert_eq!(pick_topic("  "), None);
    }

    #[test]
    fn input_commands() {
        assert!(matches!(parse_input(""), Input::Next));
        assert!(matches!(parse_input("/quit"), Input::Quit));
        assert!(matches!(parse_input("/reset"), Input::Reset));
        assert!(matches!(parse_input("hello"), Input::Say(ref t) if t == "hello"));
    }
}
