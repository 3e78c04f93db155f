//! Built-in tools
//!
//! Small self-contained tools so the binary works end-to-end out of the box.
//! Real deployments register their own tools next to (or instead of) these.

use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::{Result, ToolInput, ToolOutcome, ToolParameter};
use crate::tools::Tool;

/// Tool that evaluates arithmetic expressions
pub struct CalculatorTool;

impl CalculatorTool {
    /// Create a new calculator tool
    pub fn new() -> Self {
        Self
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression with +, -, *, / and parentheses"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "expression",
            "string",
            "The expression to evaluate, e.g. (2 + 3) * 4",
        )]
    }

    async fn invoke(&self, input: &ToolInput) -> Result<ToolOutcome> {
        let expression = input
            .get_str("expression")
            .unwrap_or_else(|| input.as_text());

        // Bad input is an observation, not an error
        match evaluate(&expression) {
            Ok(value) => Ok(ToolOutcome::observation(format!("{}", value))),
            Err(reason) => Ok(ToolOutcome::observation(format!(
                "invalid expression '{}': {}",
                expression.trim(),
                reason
            ))),
        }
    }
}

/// Tool that reports the current time
pub struct ClockTool;

impl ClockTool {
    /// Create a new clock tool
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClockTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        "clock"
    }

    fn description(&self) -> &str {
        "Get the current time as a UNIX timestamp in seconds"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        Vec::new()
    }

    async fn invoke(&self, _input: &ToolInput) -> Result<ToolOutcome> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| crate::core::ErgonError::tool("clock", e.to_string()))?;
        Ok(ToolOutcome::observation(format!(
            "unix timestamp: {}",
            now.as_secs()
        )))
    }
}

/// Tool that returns its input verbatim as the final answer
///
/// Demonstrates the return_direct short-circuit: the observation ends the run
/// without another model call.
pub struct EchoTool;

impl EchoTool {
    /// Create a new echo tool
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Answer the user with the given text exactly as written"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "text",
            "string",
            "The text to answer with",
        )]
    }

    fn return_direct(&self) -> bool {
        true
    }

    async fn invoke(&self, input: &ToolInput) -> Result<ToolOutcome> {
        let text = input.get_str("text").unwrap_or_else(|| input.as_text());
        Ok(ToolOutcome::observation(text))
    }
}

/// Evaluate an arithmetic expression
///
/// Recursive descent over `expr := term (('+'|'-') term)*`,
/// `term := factor (('*'|'/') factor)*`, `factor := number | '(' expr ')' | '-' factor`.
fn evaluate(expression: &str) -> std::result::Result<f64, String> {
    let tokens: Vec<char> = expression.chars().filter(|c| !c.is_whitespace()).collect();
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }

    let mut pos = 0;
    let value = parse_expr(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(format!("unexpected character '{}'", tokens[pos]));
    }
    Ok(value)
}

fn parse_expr(tokens: &[char], pos: &mut usize) -> std::result::Result<f64, String> {
    let mut value = parse_term(tokens, pos)?;
    while *pos < tokens.len() {
        match tokens[*pos] {
            '+' => {
                *pos += 1;
                value += parse_term(tokens, pos)?;
            }
            '-' => {
                *pos += 1;
                value -= parse_term(tokens, pos)?;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_term(tokens: &[char], pos: &mut usize) -> std::result::Result<f64, String> {
    let mut value = parse_factor(tokens, pos)?;
    while *pos < tokens.len() {
        match tokens[*pos] {
            '*' => {
                *pos += 1;
                value *= parse_factor(tokens, pos)?;
            }
            '/' => {
                *pos += 1;
                let divisor = parse_factor(tokens, pos)?;
                if divisor == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= divisor;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_factor(tokens: &[char], pos: &mut usize) -> std::result::Result<f64, String> {
    if *pos >= tokens.len() {
        return Err("unexpected end of expression".to_string());
    }

    match tokens[*pos] {
        '(' => {
            *pos += 1;
            let value = parse_expr(tokens, pos)?;
            if *pos >= tokens.len() || tokens[*pos] != ')' {
                return Err("missing closing parenthesis".to_string());
            }
            *pos += 1;
            Ok(value)
        }
        '-' => {
            *pos += 1;
            Ok(-parse_factor(tokens, pos)?)
        }
        c if c.is_ascii_digit() || c == '.' => {
            let start = *pos;
            while *pos < tokens.len() && (tokens[*pos].is_ascii_digit() || tokens[*pos] == '.') {
                *pos += 1;
            }
            let number: String = tokens[start..*pos].iter().collect();
            number
                .parse::<f64>()
                .map_err(|_| format!("malformed number '{}'", number))
        }
        c => Err(format!("unexpected character '{}'", c)),
    }
}
