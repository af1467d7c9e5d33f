//! Interactive terminal loop for `edu chat`.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::pipeline::{ChatSession, Pipeline};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "종료"];

pub fn is_exit_word(line: &str) -> bool {
    let line = line.trim();
    EXIT_WORDS.iter().any(|w| w.eq_ignore_ascii_case(line))
}

/// Run `edu chat` on stdin/stdout. Refuses to start on an empty collection.
pub async fn run_chat(pipeline: Arc<Pipeline>) -> Result<()> {
    let info = pipeline.store().info().await?;
    if info.document_count == 0 {
        bail!(
            "Collection '{}' is empty. Run `edu ingest` first.",
            info.collection_name
        );
    }

    let mut stdout = std::io::stdout();
    writeln!(stdout, "=== 교육 과정 상담 챗봇 ===")?;
    writeln!(stdout, "저장된 문서 조각: {}개", info.document_count)?;
    writeln!(stdout, "종료하려면 'quit', 'exit', '종료'를 입력하세요.")?;
    writeln!(stdout)?;

    let interactive = atty::is(atty::Stream::Stdin);
    let reader = BufReader::new(tokio::io::stdin());
    let mut session = ChatSession::new(pipeline);
    run_repl(&mut session, reader, &mut stdout, interactive).await?;

    writeln!(stdout, "상담을 종료합니다. 감사합니다.")?;
    Ok(())
}

/// Read questions line by line until an exit word or end of input.
pub async fn run_repl<R, W>(
    session: &mut ChatSession,
    reader: R,
    out: &mut W,
    show_prompt: bool,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    loop {
        if show_prompt {
            write!(out, "질문: ")?;
            out.flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit_word(question) {
            break;
        }

        let answer = session.chat(question).await;
        writeln!(out, "답변: {}", answer)?;
        writeln!(out)?;
    }
    Ok(())
}
