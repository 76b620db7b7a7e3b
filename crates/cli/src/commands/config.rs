// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::Result;

use super::Context;

pub fn run(ctx: &Context) -> Result<()> {
    println!("# state dir: {}", ctx.state_dir.display());
    print!("{}", ctx.config.to_toml()?);
    Ok(())
}
