// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;

use crate::client::ControlClient;

pub async fn handle(client: &ControlClient) -> Result<()> {
    client.stop_build(None).await?;
    println!("Stopped");
    Ok(())
}
