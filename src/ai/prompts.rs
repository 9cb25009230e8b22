// src/ai/prompts.rs
//! Prompt templates shared by the remote providers. Spanish on purpose: the
//! analyzed content and the expected entity vocabulary are Guatemalan.

pub(crate) fn sentiment_prompt(text: &str) -> String {
    format!(
        r#"Analiza este post en español de Guatemala y responde SOLO con JSON válido:
{{
  "sentiment": "positive|negative|neutral",
  "score": -1.0 a 1.0,
  "confidence": 0.0 a 1.0,
  "emotions": ["emociones detectadas"],
  "communicativeIntent": "informative|opinion|humor|alarmist|critical|promotional|conversational|protest",
  "mentionedEntities": [{{"name": "entidad", "type": "persona|organizacion|lugar|evento", "context": "breve descripción"}}]
}}

Post: "{text}"

IMPORTANTE: considera el contexto guatemalteco y usa solo las categorías especificadas."#
    )
}

pub(crate) fn classify_prompt(names: &[String]) -> String {
    let list: String = names
        .iter()
        .enumerate()
        .map(|(i, n)| format!("{i}. {n}\n"))
        .collect();
    format!(
        r#"Clasifica cada tendencia guatemalteca por tema. Responde SOLO con un arreglo JSON:
[{{"index": 0, "name": "nombre", "category": "deportes|política|económica|social|general"}}]

Tendencias:
{list}"#
    )
}

pub(crate) fn context_prompt(text: &str, trend: &str) -> String {
    format!(
        r#"Analiza este post de Guatemala para extraer información política específica.
Post: "{text}"
Tendencia: {trend}

Extrae SOLO información verificable en este JSON:
{{
  "entities": ["entidades políticas guatemaltecas"],
  "figures": [{{"name": "nombre o apodo", "real_name": "nombre real si es apodo", "role": "cargo", "context": "por qué se menciona"}}],
  "social_usernames": ["@usuarios mencionados"],
  "laws_decrees": [{{"title": "nombre", "type": "ley|decreto|acuerdo", "status": "propuesta|aprobada|en_debate"}}],
  "news_events": [{{"event": "evento", "type": "politico|judicial|electoral", "impact": "alto|medio|bajo"}}],
  "nicknames_detected": [{{"nickname": "apodo", "real_name": "nombre real", "context": "contexto"}}]
}}

Si no hay información de una categoría usa un arreglo vacío. NO inventes información."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prompt_numbers_every_trend() {
        let p = classify_prompt(&["Congreso".to_string(), "Municipal".to_string()]);
        assert!(p.contains("0. Congreso"));
        assert!(p.contains("1. Municipal"));
    }

    #[test]
    fn sentiment_prompt_embeds_post_text() {
        let p = sentiment_prompt("el congreso aprueba");
        assert!(p.contains("el congreso aprueba"));
        assert!(p.contains("communicativeIntent"));
    }
}
