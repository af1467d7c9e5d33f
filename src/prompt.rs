//! Prompt assembly: context block, system instruction, message list.

use crate::models::{QueryMatch, Turn};

/// Label used when a match carries no file path.
const UNKNOWN_SOURCE: &str = "Unknown";

const HISTORY_LINE: &str = "이전 대화 내용도 참고하여 일관성 있고 친절한 답변을 제공하세요.";

/// One labelled section per match, in retrieval order, separated by a blank line.
pub fn render_context(matches: &[QueryMatch]) -> String {
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let path = if m.metadata.file_path.is_empty() {
                UNKNOWN_SOURCE
            } else {
                m.metadata.file_path.as_str()
            };
            format!("[교육 자료 {} - {}]\n{}\n", i + 1, path, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Persona and answering policy, with the context block and question embedded.
pub fn system_instruction(context: &str, query: &str, with_history: bool) -> String {
    let mut intro = String::from(
        "당신은 교육 서비스 회사의 공손하고 전문적인 상담원입니다. \n\
         다음 교육 과정 정보를 기반으로 고객의 질문에 답변해주세요.\n",
    );
    if with_history {
        intro.push_str(HISTORY_LINE);
        intro.push('\n');
    }

    format!(
        "{intro}\n\
         **응답 스타일:**\n\
         - 공손하고 친절한 톤으로 답변\n\
         - \"~입니다\", \"~하시면 됩니다\" 등의 존댓말 사용\n\
         - 교육 과정 정보가 없으면 \"해당 정보는 현재 제공되지 않습니다\"라고 답변\n\
         - 가능하면 구체적인 과정명, 커리큘럼, 수강료, 기간 등을 포함\n\
         - 추가 문의사항이 있으면 언제든 연락주시라고 안내\n\
         \n\
         **교육 과정 정보:**\n\
         {context}\n\
         \n\
         **고객 질문:** {query}\n\
         \n\
         **답변:**"
    )
}

/// `[system, ...history, user(query)]`.
pub fn build_messages(system: String, history: &[Turn], query: &str) -> Vec<Turn> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Turn::system(system));
    messages.extend(history.iter().cloned());
    messages.push(Turn::user(query));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, Role};

    fn matched(path: &str, content: &str) -> QueryMatch {
        QueryMatch {
            id: format!("{}_0_0", path),
            content: content.to_string(),
            metadata: ChunkMetadata {
                file_path: path.to_string(),
                file_type: ".txt".to_string(),
                chunk_index: 0,
                total_chunks: 1,
            },
            distance: 0.1,
        }
    }

    #[test]
    fn context_labels_each_match_in_order() {
        let context = render_context(&[
            matched("a.txt", "Course X costs 500,000 won"),
            matched("b.pdf", "Course Y runs 8 weeks"),
        ]);
        assert_eq!(
            context,
            "[교육 자료 1 - a.txt]\nCourse X costs 500,000 won\n\n\
             [교육 자료 2 - b.pdf]\nCourse Y runs 8 weeks\n"
        );
    }

    #[test]
    fn missing_path_renders_unknown() {
        let context = render_context(&[matched("", "text")]);
        assert!(context.starts_with("[교육 자료 1 - Unknown]"));
    }

    #[test]
    fn instruction_embeds_context_and_question() {
        let text = system_instruction("CONTEXT", "수강료가 얼마인가요?", false);
        assert!(text.contains("**교육 과정 정보:**\nCONTEXT\n"));
        assert!(text.contains("**고객 질문:** 수강료가 얼마인가요?"));
        assert!(text.contains("해당 정보는 현재 제공되지 않습니다"));
        assert!(text.ends_with("**답변:**"));
        assert!(!text.contains(HISTORY_LINE));
    }

    #[test]
    fn history_variant_adds_consistency_line() {
        let text = system_instruction("C", "Q", true);
        assert!(text.contains(HISTORY_LINE));
    }

    #[test]
    fn messages_wrap_history() {
        let history = vec![Turn::user("first"), Turn::assistant("reply")];
        let messages = build_messages("sys".to_string(), &history, "second");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[3].content, "second");
    }
}
