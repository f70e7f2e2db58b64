use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use glucolog_core::service::TrackerService;

use super::helpers::generate_api_key;

pub(crate) fn cmd_user_add(svc: &TrackerService, name: &str, json: bool) -> Result<()> {
    let user = svc.create_user(name, &generate_api_key())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Created profile '{}'", user.name);
        println!("API key: {}", user.api_key);
        println!("Include in REST requests: Authorization: Bearer {}", user.api_key);
    }
    Ok(())
}

pub(crate) fn cmd_user_list(svc: &TrackerService, json: bool) -> Result<()> {
    let users = svc.list_users()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else if users.is_empty() {
        eprintln!("No profiles yet. Use `glucolog user add` to create one.");
    } else {
        #[derive(Tabled)]
        struct UserRow {
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "API key")]
            api_key: String,
            #[tabled(rename = "Created")]
            created: String,
        }

        let rows: Vec<UserRow> = users
            .iter()
            .map(|u| UserRow {
                name: u.name.clone(),
                // Enough to recognize the key without printing the whole secret
                api_key: format!("{}...", &u.api_key[..8.min(u.api_key.len())]),
                created: u.created_at.chars().take(10).collect(),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }
    Ok(())
}
