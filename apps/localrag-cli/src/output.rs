use localrag_core::types::{FusedContext, FusedRecord, META_FILE_NAME};
use localrag_hybrid::Answer;

fn provenance(r: &FusedRecord) -> String {
    let mut parts = Vec::new();
    if let Some(v) = r.vector {
        parts.push(format!("vector #{} {:.3}", v.rank + 1, v.score));
    }
    if let Some(k) = r.keyword {
        parts.push(format!("keyword #{} {:.2}", k.rank + 1, k.score));
    }
    parts.join(", ")
}

fn source_name(r: &FusedRecord) -> &str {
    r.record.meta.get(META_FILE_NAME).map(String::as_str).unwrap_or(r.record.doc_id.as_str())
}

pub fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    if !answer.context.is_empty() {
        println!();
        println!("Sources:");
        for (i, r) in answer.context.records.iter().enumerate() {
            println!("  [{}] {} ({})", i + 1, source_name(r), provenance(r));
        }
    }
}

pub fn print_context(context: &FusedContext) {
    if context.is_empty() {
        println!("No matching records.");
        return;
    }
    for (i, r) in context.records.iter().enumerate() {
        println!("{}. {} [{}] ({})", i + 1, r.record.id, source_name(r), provenance(r));
        let preview: String = r.record.text.chars().take(240).collect();
        println!("   {preview}");
    }
}
