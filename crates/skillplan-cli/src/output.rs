use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Column-aligned listing builder. Collect rows, then `print` once; widths
/// are sized to the widest cell per column.
pub struct Table {
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &'static [&'static str]) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        debug_assert_eq!(cells.len(), self.headers.len());
        self.rows.push(cells);
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }

    fn render(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].len())
                    .chain([h.len()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let line = |out: &mut String, cells: Vec<String>| {
            let joined = cells.join("  ");
            out.push_str(joined.trim_end());
            out.push('\n');
        };

        line(
            &mut out,
            self.headers
                .iter()
                .zip(&widths)
                .map(|(h, &w)| format!("{h:<w$}"))
                .collect(),
        );
        line(&mut out, widths.iter().map(|w| "-".repeat(*w)).collect());
        for row in &self.rows {
            line(
                &mut out,
                row.iter()
                    .zip(&widths)
                    .map(|(cell, &w)| format!("{cell:<w$}"))
                    .collect(),
            );
        }
        out
    }
}
