use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use vitalog_core::models::{
    ChatCategory, ChatRequest, NewSavedMessage, SavedChatMessage, SavedMessageUpdate,
    validate_new_saved_message, validate_saved_message_update,
};
use vitalog_core::responder::suggest_category;

use super::helpers::{print_json, truncate};
use crate::backend::Backend;

fn parse_category(category: Option<&str>) -> Result<Option<ChatCategory>> {
    category.map(str::parse::<ChatCategory>).transpose()
}

/// Options for keeping a one-shot chat exchange.
pub(crate) struct SaveOptions {
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

pub(crate) async fn cmd_chat(
    backend: &Backend,
    message: Option<String>,
    session_id: Option<String>,
    save: Option<SaveOptions>,
    json: bool,
) -> Result<()> {
    let Some(message) = message else {
        return chat_loop(backend, session_id, json).await;
    };

    let response = backend
        .chat(&ChatRequest {
            message: message.clone(),
            session_id,
        })
        .await?;

    let saved = match save {
        Some(opts) => {
            let category = match parse_category(opts.category.as_deref())? {
                Some(c) => c,
                None => suggest_category(&message),
            };
            let title = opts
                .title
                .unwrap_or_else(|| truncate(message.trim(), 40));
            let new = NewSavedMessage {
                original_message: message,
                ai_response: response.response.clone(),
                category,
                title,
                tags: opts.tags,
            };
            validate_new_saved_message(&new)?;
            Some(backend.save_message(&new).await?)
        }
        None => None,
    };

    if json {
        return print_json(&serde_json::json!({
            "response": response.response,
            "session_id": response.session_id,
            "saved": saved,
        }));
    }

    println!("{}", response.response);
    if let Some(s) = saved {
        eprintln!("Saved as {} ({})", s.id, s.category);
    }
    Ok(())
}

/// Read questions from stdin until EOF or `exit`, keeping one session.
async fn chat_loop(backend: &Backend, mut session_id: Option<String>, json: bool) -> Result<()> {
    let stdin = io::stdin();
    loop {
        if !json {
            eprint!("> ");
            io::stderr().flush()?;
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        let response = backend
            .chat(&ChatRequest {
                message: message.to_string(),
                session_id: session_id.clone(),
            })
            .await?;
        if json {
            println!("{}", serde_json::to_string(&response)?);
        } else {
            println!("{}\n", response.response);
        }
        session_id = Some(response.session_id);
    }
    Ok(())
}

pub(crate) async fn cmd_chat_history(
    backend: &Backend,
    session_id: &str,
    json: bool,
) -> Result<()> {
    let session = backend.chat_history(session_id).await?;
    if json {
        return print_json(&session);
    }
    if session.messages.is_empty() {
        eprintln!("No messages in session {session_id}.");
        return Ok(());
    }
    for m in &session.messages {
        let who = if m.is_user { "You" } else { "Assistant" };
        let at = m.timestamp.get(..16).unwrap_or(m.timestamp.as_str());
        println!("[{at}] {who}: {}\n", m.message);
    }
    Ok(())
}

// --- Saved messages ---

fn print_saved_table(messages: &[SavedChatMessage]) {
    #[derive(Tabled)]
    struct SavedRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Tags")]
        tags: String,
        #[tabled(rename = "Saved")]
        created: String,
    }

    let rows: Vec<SavedRow> = messages
        .iter()
        .map(|m| SavedRow {
            id: m.id.clone(),
            title: truncate(&m.title, 35),
            category: m.category.to_string(),
            tags: m.tags.join(", "),
            created: m.created_at.get(..10).unwrap_or(m.created_at.as_str()).to_string(),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

fn print_saved(m: &SavedChatMessage) {
    println!("{} [{}]", m.title, m.category);
    if !m.tags.is_empty() {
        println!("Tags: {}", m.tags.join(", "));
    }
    println!("\nQ: {}\n\nA: {}", m.original_message, m.ai_response);
}

pub(crate) async fn cmd_saved_list(
    backend: &Backend,
    category: Option<&str>,
    tag: Option<&str>,
    json: bool,
) -> Result<()> {
    let category = parse_category(category)?;
    let messages = backend.saved_messages(category, tag).await?;

    if json {
        print_json(&messages)
    } else if messages.is_empty() {
        eprintln!("No saved messages.");
        Ok(())
    } else {
        print_saved_table(&messages);
        Ok(())
    }
}

pub(crate) async fn cmd_saved_add(
    backend: &Backend,
    question: String,
    answer: String,
    opts: SaveOptions,
    json: bool,
) -> Result<()> {
    let category = match parse_category(opts.category.as_deref())? {
        Some(c) => c,
        None => suggest_category(&question),
    };
    let new = NewSavedMessage {
        title: opts.title.unwrap_or_else(|| truncate(question.trim(), 40)),
        original_message: question,
        ai_response: answer,
        category,
        tags: opts.tags,
    };
    validate_new_saved_message(&new)?;
    let saved = backend.save_message(&new).await?;

    if json {
        print_json(&saved)
    } else {
        println!("Saved {} ({})", saved.id, saved.category);
        Ok(())
    }
}

pub(crate) async fn cmd_saved_show(backend: &Backend, id: &str, json: bool) -> Result<()> {
    let Some(message) = backend.get_saved_message(id).await? else {
        bail!("Saved message {id} not found");
    };
    if json {
        print_json(&message)
    } else {
        print_saved(&message);
        Ok(())
    }
}

pub(crate) async fn cmd_saved_update(
    backend: &Backend,
    id: &str,
    title: Option<String>,
    category: Option<&str>,
    tags: Option<Vec<String>>,
    json: bool,
) -> Result<()> {
    let update = SavedMessageUpdate {
        title,
        category: parse_category(category)?,
        tags,
    };
    if update.title.is_none() && update.category.is_none() && update.tags.is_none() {
        bail!("Nothing to update. Pass --title, --category or --tag");
    }
    validate_saved_message_update(&update)?;

    let Some(message) = backend.update_saved_message(id, &update).await? else {
        bail!("Saved message {id} not found");
    };
    if json {
        print_json(&message)
    } else {
        println!("Updated {}: {} [{}]", message.id, message.title, message.category);
        Ok(())
    }
}

pub(crate) async fn cmd_saved_delete(backend: &Backend, id: &str, json: bool) -> Result<()> {
    if !backend.delete_saved_message(id).await? {
        bail!("Saved message {id} not found");
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted saved message {id}");
    }
    Ok(())
}

pub(crate) async fn cmd_saved_categories(backend: &Backend, json: bool) -> Result<()> {
    let counts = backend.category_counts().await?;

    if json {
        return print_json(&counts);
    }

    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Messages")]
        count: usize,
    }

    let rows: Vec<CategoryRow> = counts
        .iter()
        .map(|c| CategoryRow {
            category: c.category.to_string(),
            count: c.count,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}
