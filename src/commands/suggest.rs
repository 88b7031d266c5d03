use std::io::{self, Write};

use anyhow::{Context, Result};
use serde_json::json;

use crate::cli::SuggestArgs;
use crate::nlp::{EXAMPLE_QUERIES, SUGGESTED_QUERIES};

pub fn run(args: SuggestArgs) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    if args.json {
        let value = if args.examples {
            json!({ "examples": EXAMPLE_QUERIES })
        } else {
            json!({ "suggestions": SUGGESTED_QUERIES })
        };
        serde_json::to_writer_pretty(&mut output, &value)
            .context("failed to serialize suggestions")?;
        writeln!(output)?;
    } else if args.examples {
        for example in &EXAMPLE_QUERIES {
            writeln!(output, "{}", example.query)?;
            writeln!(
                output,
                "\t{} ({})",
                example.description,
                example.expected_result_type.as_str()
            )?;
        }
    } else {
        for suggestion in SUGGESTED_QUERIES {
            writeln!(output, "{suggestion}")?;
        }
    }

    output.flush()?;
    Ok(())
}
