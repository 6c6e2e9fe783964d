//! Text command parsing.
//!
//! The first token selects the command and is matched case-insensitively. Arguments are
//! lower-cased and split on whitespace.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
	/// Tag search augmented with the invoking user's preferences.
	Tags,
	/// Token-authenticated gif search.
	Gifs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GimmeRequest {
	pub kind: ProviderKind,
	pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsCommand {
	List,
	Set(Vec<String>),
	Add(Vec<String>),
	Remove(Vec<String>),
	Usage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	Gimme(GimmeRequest),
	Prefs(PrefsCommand),
	More,
	Unknown(String),
}
impl Command {
	/// Returns `None` for messages without any token.
	pub fn parse(content: &str) -> Option<Self> {
		let mut tokens = content.split_whitespace();
		let head = tokens.next()?.to_lowercase();
		let args = tokens.map(str::to_lowercase).collect::<Vec<_>>();
		let command = match head.as_str() {
			"gimme" => Self::Gimme(GimmeRequest::from_args(args)),
			"prefs" => Self::Prefs(PrefsCommand::from_args(args)),
			"more" => Self::More,
			_ => Self::Unknown(head),
		};

		Some(command)
	}
}

impl GimmeRequest {
	fn from_args(mut args: Vec<String>) -> Self {
		if args.first().is_some_and(|arg| arg == "gif") {
			args.remove(0);

			return Self { kind: ProviderKind::Gifs, tags: args };
		}

		Self { kind: ProviderKind::Tags, tags: args }
	}
}

impl PrefsCommand {
	pub const USAGE: &str = "Usage: prefs set|add|remove|list <terms...>";

	fn from_args(mut args: Vec<String>) -> Self {
		if args.is_empty() {
			return Self::Usage;
		}

		let sub = args.remove(0);

		match sub.as_str() {
			"list" => Self::List,
			// An empty set clears every preference.
			"set" => Self::Set(args),
			"add" if !args.is_empty() => Self::Add(args),
			"remove" if !args.is_empty() => Self::Remove(args),
			_ => Self::Usage,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(raw: &[&str]) -> Vec<String> {
		raw.iter().map(|word| word.to_string()).collect()
	}

	#[test]
	fn gimme_defaults_to_tag_search() {
		assert_eq!(
			Command::parse("GIMME Cats  Red"),
			Some(Command::Gimme(GimmeRequest {
				kind: ProviderKind::Tags,
				tags: words(&["cats", "red"]),
			}))
		);
	}

	#[test]
	fn gif_keyword_selects_gif_search() {
		assert_eq!(
			Command::parse("gimme Gif dancing cat"),
			Some(Command::Gimme(GimmeRequest {
				kind: ProviderKind::Gifs,
				tags: words(&["dancing", "cat"]),
			}))
		);
		assert_eq!(
			Command::parse("gimme cat gif"),
			Some(Command::Gimme(GimmeRequest {
				kind: ProviderKind::Tags,
				tags: words(&["cat", "gif"]),
			}))
		);
	}

	#[test]
	fn prefs_subcommands() {
		assert_eq!(Command::parse("prefs list"), Some(Command::Prefs(PrefsCommand::List)));
		assert_eq!(
			Command::parse("Prefs SET red small"),
			Some(Command::Prefs(PrefsCommand::Set(words(&["red", "small"]))))
		);
		assert_eq!(Command::parse("prefs set"), Some(Command::Prefs(PrefsCommand::Set(Vec::new()))));
		assert_eq!(
			Command::parse("prefs add blue"),
			Some(Command::Prefs(PrefsCommand::Add(words(&["blue"]))))
		);
		assert_eq!(
			Command::parse("prefs remove blue"),
			Some(Command::Prefs(PrefsCommand::Remove(words(&["blue"]))))
		);
		assert_eq!(Command::parse("prefs add"), Some(Command::Prefs(PrefsCommand::Usage)));
		assert_eq!(Command::parse("prefs"), Some(Command::Prefs(PrefsCommand::Usage)));
		assert_eq!(Command::parse("prefs sort"), Some(Command::Prefs(PrefsCommand::Usage)));
	}

	#[test]
	fn more_and_unknown() {
		assert_eq!(Command::parse("  MORE  please"), Some(Command::More));
		assert_eq!(Command::parse("ping"), Some(Command::Unknown("ping".to_string())));
		assert_eq!(Command::parse("   "), None);
	}
}
