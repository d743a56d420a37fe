// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Result rendering for stdout

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    json_lines: bool,
}

impl Output {
    pub fn new(json_lines: bool) -> Self {
        Self { json_lines }
    }

    pub fn render_value<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    /// A pretty JSON array, or one compact object per line in json-lines mode
    pub fn render_list<T: Serialize>(&self, items: &[T]) -> anyhow::Result<String> {
        if !self.json_lines {
            return self.render_value(&items);
        }

        let lines = items
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", self.render_value(value)?);
        Ok(())
    }

    pub fn print_list<T: Serialize>(&self, items: &[T]) -> anyhow::Result<()> {
        let rendered = self.render_list(items)?;
        if !rendered.is_empty() {
            println!("{}", rendered);
        }
        Ok(())
    }
}
