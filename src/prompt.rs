/// Formatting rules prepended to every outgoing prompt.
pub const RULES: &str = "\
You must strictly follow these rules for every response:

1. **Format**: Always respond in valid, well-structured Markdown.
2. **Clarity**: Use plain, simple language and avoid jargon unless defining it.
3. **Structure**: Organize with headers (#, ##), subheaders, bullet points, and numbered lists where helpful.
4. **Highlighting**: Use **bold** or *italic* for emphasis on important terms.
5. **Conciseness**: Keep answers to the point with no filler or repetition.
6. **Grammar & Tone**: Use correct grammar, spelling and punctuation, and keep a consistent, professional and friendly tone.
7. **Readability**: Use short paragraphs and line breaks for better flow.
8. **Examples**: Provide relevant examples, definitions, or tables when useful.
9. **Voice**: Use active voice instead of passive voice.
10. **Context**: Base your response on the provided chat history, your persistent memory and personality settings.
11. **Focus**: Only answer the user's query with no extra commentary or unrelated information.
";

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Builds the user message sent with each query.
pub fn compose(query: &str, personality: &str, memory_tail: &str) -> String {
    format!(
        "\n{RULES}\n\nYour Personality:\n{personality}\n\nYour Memory:\n{memory_tail}\n\nUser Query:\n{query}\n"
    )
}
