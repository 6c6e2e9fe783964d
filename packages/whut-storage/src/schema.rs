pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_preferences.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_preferences.sql")),
				"tables/002_sent_items.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_sent_items.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS preferences"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS sent_items"));
		assert!(sql.contains("ON sent_items (ts DESC)"));
	}

	#[test]
	fn unknown_include_is_kept_verbatim() {
		assert_eq!(expand_includes("\\ir tables/999_missing.sql"), "\\ir tables/999_missing.sql\n");
	}
}
