// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status command handler

use anyhow::Result;

use crate::client::ControlClient;
use crate::output::{format_status, OutputFormat};

pub async fn handle(client: &ControlClient, format: OutputFormat) -> Result<()> {
    let status = client.status().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Text => match status {
            Some(status) => print!("{}", format_status(&status)),
            None => println!("No build deployed"),
        },
    }

    Ok(())
}
