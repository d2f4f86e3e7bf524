//! Request/response front end over the engine.
//!
//! A [`Calculator`] takes expression bytes through [`Calculator::write`] and
//! hands back the rendering of the most recent result through
//! [`Calculator::read`]. Each request parses, evaluates and destroys its own
//! tree; nothing is shared between calculators.

use crate::ast::{destroy, Evaluator, Parser, SyntaxError, Variables};
use crate::fixed::Value;
use log::{error, info};
use std::str::FromStr;
use thiserror::Error;

/// Size of the request buffer. Requests must be strictly shorter.
pub const DEFAULT_MAX_INPUT_LEN: usize = 256;

/// Environment variable selecting the [`OutputFormat`].
pub const OUTPUT_ENV: &str = "FIXCALC_OUTPUT";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Expression too long: {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("Unknown output format '{0}', expected 'raw' or 'decimal'")]
    UnknownOutputFormat(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The raw 64-bit encoding as an unsigned decimal integer.
    #[default]
    Raw,
    /// The fixed-point value as a decimal number, `NaN` or `Inf`.
    Decimal,
}

impl OutputFormat {
    pub fn render(self, value: Value) -> String {
        match self {
            OutputFormat::Raw => format!("{}\n", value.to_bits()),
            OutputFormat::Decimal => format!("{}\n", value),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(OutputFormat::Raw),
            "decimal" => Ok(OutputFormat::Decimal),
            _ => Err(SessionError::UnknownOutputFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_input_len: usize,
    pub output: OutputFormat,
    /// Keep variable bindings from one request to the next.
    pub keep_variables: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            output: OutputFormat::default(),
            keep_variables: false,
        }
    }
}

pub struct Calculator {
    config: Config,
    evaluator: Evaluator,
    variables: Variables,
    result: Value,
}

impl Calculator {
    pub fn new(config: Config) -> Self {
        Self::with_evaluator(config, Evaluator::new())
    }

    pub fn with_evaluator(config: Config, evaluator: Evaluator) -> Self {
        Self {
            config,
            evaluator,
            variables: Variables::new(),
            result: Value::ZERO,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The most recent result; zero before the first successful request.
    pub fn result(&self) -> Value {
        self.result
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Evaluates one request and returns the number of bytes consumed.
    ///
    /// The text ends at the first NUL byte, if any. On error the previous
    /// result is kept.
    pub fn write(&mut self, input: &[u8]) -> Result<usize, SessionError> {
        if input.len() >= self.config.max_input_len {
            error!("Expression too long: {} bytes", input.len());
            return Err(SessionError::TooLong {
                len: input.len(),
                max: self.config.max_input_len,
            });
        }
        let text = match input.iter().position(|&byte| byte == 0) {
            Some(end) => &input[..end],
            None => input,
        };
        info!("Received {} -> {}", input.len(), String::from_utf8_lossy(text));

        let mut variables = std::mem::take(&mut self.variables);
        let mut ast = match Parser::parse_bytes(text, &mut variables, self.evaluator.registry()) {
            Ok(ast) => ast,
            Err(e) => {
                error!("Syntax error: {}", e);
                self.finish(variables);
                return Err(e.into());
            }
        };

        self.result = ast.eval(&mut variables);
        info!("Result: {}", self.result.to_bits());

        if self.config.keep_variables {
            drop(ast);
            self.finish(variables);
        } else {
            destroy(ast, variables);
        }
        Ok(input.len())
    }

    /// Renders the most recent result in the configured format.
    pub fn read(&self) -> String {
        self.config.output.render(self.result)
    }

    fn finish(&mut self, variables: Variables) {
        if self.config.keep_variables {
            self.variables = variables;
        } else {
            variables.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal() -> Calculator {
        Calculator::new(Config {
            output: OutputFormat::Decimal,
            ..Config::default()
        })
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_input_len, 256);
        assert_eq!(config.output, OutputFormat::Raw);
        assert!(!config.keep_variables);
    }

    #[test]
    fn test_raw_output() {
        let mut calculator = Calculator::new(Config::default());
        assert_eq!(calculator.read(), "0\n");
        assert_eq!(calculator.write(b"1 + 2"), Ok(5));
        assert_eq!(calculator.read(), "12884901888\n");
        calculator.write(b"0 / 0").unwrap();
        assert_eq!(calculator.read(), "9223372036854775808\n");
        calculator.write(b"1 / 0").unwrap();
        assert_eq!(calculator.read(), "9223372036854775807\n");
        calculator.write(b"-1").unwrap();
        assert_eq!(calculator.read(), "18446744069414584320\n");
    }

    #[test]
    fn test_decimal_output() {
        let mut calculator = decimal();
        calculator.write(b"7 / 2").unwrap();
        assert_eq!(calculator.read(), "3.5\n");
        calculator.write(b"sqrt(16)").unwrap();
        assert_eq!(calculator.read(), "4\n");
        calculator.write(b"0 / 0").unwrap();
        assert_eq!(calculator.read(), "NaN\n");
        calculator.write(b"1 / 0").unwrap();
        assert_eq!(calculator.read(), "Inf\n");
    }

    #[test]
    fn test_too_long_keeps_result() {
        let mut calculator = decimal();
        calculator.write(b"42").unwrap();

        let long = vec![b'1'; 256];
        assert_eq!(
            calculator.write(&long),
            Err(SessionError::TooLong { len: 256, max: 256 })
        );
        assert_eq!(calculator.read(), "42\n");

        let mut fits = b"1".to_vec();
        fits.resize(255, b' ');
        assert_eq!(calculator.write(&fits), Ok(255));
        assert_eq!(calculator.read(), "1\n");
    }

    #[test]
    fn test_syntax_error_keeps_result() {
        let mut calculator = decimal();
        calculator.write(b"6 * 7").unwrap();
        let error = calculator.write(b"(1+2").unwrap_err();
        assert!(matches!(error, SessionError::Syntax(SyntaxError::Grammar(_))));
        assert_eq!(
            calculator.write(b"nosuch(1)"),
            Err(SessionError::Syntax(SyntaxError::UnknownFunction(
                "nosuch".to_string()
            )))
        );
        assert_eq!(
            calculator.write(&[b'1', 0xC3, 0xA9]),
            Err(SessionError::Syntax(SyntaxError::InvalidEncoding))
        );
        assert_eq!(calculator.result(), Value::from_int(42));
    }

    #[test]
    fn test_input_ends_at_nul() {
        let mut calculator = decimal();
        assert_eq!(calculator.write(b"2 * 3\0garbage"), Ok(13));
        assert_eq!(calculator.read(), "6\n");
    }

    #[test]
    fn test_variables_reset_between_requests() {
        let mut calculator = decimal();
        calculator.write(b"x = 5").unwrap();
        calculator.write(b"x").unwrap();
        assert_eq!(calculator.result(), Value::ZERO);
        assert!(calculator.variables().is_empty());
    }

    #[test]
    fn test_keep_variables() {
        let mut calculator = Calculator::new(Config {
            keep_variables: true,
            ..Config::default()
        });
        calculator.write(b"x = 5").unwrap();
        calculator.write(b"y = x * 2").unwrap();
        calculator.write(b"x + y").unwrap();
        assert_eq!(calculator.result(), Value::from_int(15));
        assert_eq!(calculator.variables().value("y"), Some(Value::from_int(10)));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("raw".parse::<OutputFormat>(), Ok(OutputFormat::Raw));
        assert_eq!(" Decimal ".parse::<OutputFormat>(), Ok(OutputFormat::Decimal));
        assert_eq!(
            "hex".parse::<OutputFormat>(),
            Err(SessionError::UnknownOutputFormat("hex".to_string()))
        );
    }
}
