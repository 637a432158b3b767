use crate::utils::WordRecord;

/// System instruction. `{context}` and `{input}` are substituted per turn.
pub const SYSTEM_TEMPLATE: &str = r#"Sen, sana verilen verisetindeki kelimeleri analiz eden, İngilizce kelimelerin Türkçe anlamlarını ve Türkçe kelimelerin İngilizce anlamlarını ve örnek cümlelerini sağlayan bir Dil eğitmenisin.

***GÖREV KURALLARI***

1.  **Sorgu Tipi Belirleme:** Kullanıcının sorusunun amacına göre hareket et:
    **Tekil Kelime Sorgusu (Örn: "jacket kelimesi ne demek?"):** Sadece kullanıcının sorduğu İngilizce kelimeyi Bağlam'da ara. Bulursan, Bağlam'daki seviye bilgisini (A1, B2 vb.) kullanarak formatı *sadece o kelime* için uygula ve o kelimeye ait İngilizce örnek cümleler üret.
    **Seviye/Toplu Sorgu (Örn: "A1 kelimelerini ver."):** Bağlam'dan istenen seviyeye uygun (varsa) **minimum 3 kelime** seç ve formatı uygula.

2.  **Cümle Kuralı:** Seçtiğin her İngilizce kelime için, kelimenin farklı kullanım tonlarını gösteren **bağlamdan bağımsız en az 3 farklı doğru İngilizce örnek cümle** kur.
3.  **Format Kuralı:** Cevabını sadece aşağıdaki **Örnek Cevap Formatına** uygun olarak düzenle.

---
Bağlam (Context):
{context}
---
Soru (Question): {input}

***
Örnek Cevap Formatı:

### 1. [İngilizce Kelime]
- **Türkçe Anlamı:** [Anlam]
- **Örnek Cümleler:**
    1. [Cümle 1]
    2. [Cümle 2]
    3. [Cümle 3]
### 2. [Türkçe Kelime]
- **İngilizce Anlamı:** [Anlam]
- **Örnek Cümleler:**
    1. [Cümle 1]
    2. [Cümle 2]
    3. [Cümle 3]
***
"#;

/// A rendered system instruction plus the user's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Context block: record texts one per line, in retrieval order.
pub fn format_context(records: &[WordRecord]) -> String {
    records
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn assemble_prompt(records: &[WordRecord], input: &str) -> Prompt {
    Prompt {
        system: render(SYSTEM_TEMPLATE, &format_context(records), input),
        user: input.to_string(),
    }
}

/// Single pass: substituted text is never scanned for placeholders.
fn render(template: &str, context: &str, input: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + input.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{input}") {
            out.push_str(input);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, line_number: usize) -> WordRecord {
        WordRecord {
            text: text.to_string(),
            source_file: "words.txt".to_string(),
            line_number,
        }
    }

    #[test]
    fn test_context_keeps_retrieval_order() {
        let records = vec![record("run - koşmak (A1)", 2), record("jacket - ceket (A1)", 1)];
        assert_eq!(format_context(&records), "run - koşmak (A1)\njacket - ceket (A1)");
    }

    #[test]
    fn test_prompt_carries_rules_context_and_question() {
        let records = vec![record("jacket - ceket (A1)", 1)];
        let prompt = assemble_prompt(&records, "jacket kelimesi ne demek?");

        assert!(prompt.system.contains("Bağlam (Context):\njacket - ceket (A1)\n---"));
        assert!(prompt.system.contains("Soru (Question): jacket kelimesi ne demek?"));
        assert!(prompt.system.contains("**minimum 3 kelime**"));
        assert!(prompt.system.contains("en az 3 farklı doğru İngilizce örnek cümle"));
        assert!(prompt.system.contains("### 1. [İngilizce Kelime]"));
        assert!(prompt.system.contains("- **Örnek Cümleler:**"));
        assert!(!prompt.system.contains("{context}"));
        assert!(!prompt.system.contains("{input}"));
        assert_eq!(prompt.user, "jacket kelimesi ne demek?");
    }

    #[test]
    fn test_placeholders_in_input_are_not_expanded() {
        let records = vec![record("jacket - ceket (A1)", 1)];
        let prompt = assemble_prompt(&records, "what is {context}?");

        assert!(prompt.system.contains("Soru (Question): what is {context}?"));
        assert_eq!(prompt.system.matches("jacket - ceket (A1)").count(), 1);
    }

    #[test]
    fn test_placeholders_in_records_are_not_expanded() {
        let records = vec![record("odd entry {input}", 1)];
        let prompt = assemble_prompt(&records, "jacket");

        assert!(prompt.system.contains("Bağlam (Context):\nodd entry {input}\n---"));
        assert!(prompt.system.contains("Soru (Question): jacket"));
    }

    #[test]
    fn test_empty_context() {
        let prompt = assemble_prompt(&[], "nonexistentword");
        assert!(prompt.system.contains("Bağlam (Context):\n\n---"));
    }
}
