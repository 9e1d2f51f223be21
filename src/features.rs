use std::fmt;
use std::str::FromStr;

/// Optional extras the translator emits around the translated commands.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Set SP to 256 before the first command.
    pub bootstrap: bool,
    /// Precede each command's code with a `// <command>` comment.
    pub annotate: bool,
    /// Finish the program with an infinite loop.
    pub halt: bool,
}

impl Features {
    pub fn all() -> Self {
        Features {
            bootstrap: true,
            annotate: true,
            halt: true,
        }
    }
}

impl FromStr for Features {
    type Err = String;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let mut features = Self::default();
        for word in string.split(',') {
            let value = match word.trim() {
                "" => continue,
                "bootstrap" => &mut features.bootstrap,
                "annotate" => &mut features.annotate,
                "halt" => &mut features.halt,
                _ => return Err(format!("Unknown feature '{}'", word)),
            };
            if *value {
                return Err(format!("Cannot specify feature '{}' twice", word));
            }
            *value = true;
        }
        Ok(features)
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let features = [
            ("bootstrap", self.bootstrap),
            ("annotate", self.annotate),
            ("halt", self.halt),
        ];
        let mut has_any_feature = false;
        for (name, value) in features {
            if !value {
                continue;
            }
            if has_any_feature {
                write!(f, ",")?;
            }
            write!(f, "{}", name)?;
            has_any_feature = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list() {
        let features: Features = "halt,bootstrap".parse().unwrap();
        assert!(features.bootstrap && features.halt && !features.annotate);
        assert_eq!(features.to_string(), "bootstrap,halt");
        assert_eq!("".parse::<Features>().unwrap(), Features::default());
        assert_eq!(Features::all().to_string(), "bootstrap,annotate,halt");
    }

    #[test]
    fn parse_rejects_unknown_and_repeated() {
        assert!("bootstrap,fast".parse::<Features>().is_err());
        assert!("halt,halt".parse::<Features>().is_err());
    }
}
