// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! dynabus command-line entry point.

use dynabus_bin::error::report_error;
use dynabus_bin::{commands, init_logging, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_logging(&cli.log_level, cli.log_format);

    if let Err(error) = commands::execute(cli).await {
        report_error(&error);
        std::process::exit(error.exit_code());
    }
}
