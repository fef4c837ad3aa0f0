use crate::domain::model::ConfigurationField;
use crate::domain::ports::Prompt;
use crate::utils::error::{OrderError, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// Asks the operator to pick configuration values by index.
pub struct ConsolePrompt<R, W> {
    reader: R,
    writer: W,
}

impl ConsolePrompt<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsolePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    async fn print(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<R, W> Prompt for ConsolePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn ask(&mut self, field: &ConfigurationField, attempt: usize) -> Result<String> {
        if attempt == 0 {
            let mut menu = format!(
                "> cart item manual configuration, select a value for {}\n",
                field.label
            );
            for (index, value) in field.allowed_values.iter().enumerate() {
                menu.push_str(&format!("  {}: {}\n", index, value));
            }
            self.print(&menu).await?;
        }
        self.print("> Choice: ").await?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(OrderError::InputError {
                label: field.label.clone(),
                message: "input closed before a value was chosen".to_string(),
            });
        }

        Ok(line.trim().to_string())
    }

    async fn reject(&mut self, reason: &str) -> Result<()> {
        self.print(&format!("  invalid choice: {}\n", reason)).await
    }
}
