const NLP_QUERY_PROMPT: &str = "You are an HR data analyst assistant. Answer the user's question based on the data provided.

## User Question
{question}

## Data Results
{data_results}

## Your Task
Provide a clear, concise answer to the question based on the data. Include specific numbers when relevant. Keep your response under 100 words.

## Response:";

pub fn build_nlp_query_prompt(question: &str, data_results: &str) -> String {
    NLP_QUERY_PROMPT
        .replace("{data_results}", data_results.trim())
        .replace("{question}", question.trim())
}
