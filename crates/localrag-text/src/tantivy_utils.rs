use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};
use tantivy::Index;

pub const TOKENIZER: &str = "text_with_stopwords";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field("id", STRING | STORED);
	schema_builder.add_text_field("doc_id", STRING | STORED);
	schema_builder.add_u64_field("ordinal", STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	schema_builder.add_text_field("text", text_options);
	schema_builder.add_text_field("meta", STORED);
	schema_builder.build()
}

pub fn build_analyzer() -> TextAnalyzer {
	let stop_words = [
		"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	];
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build()
}

pub fn register_tokenizer(index: &Index) {
	index.tokenizers().register(TOKENIZER, build_analyzer());
}

/// Lowercased, stop-word-free, deduplicated terms of `text`, in first-seen order.
pub fn analyze(text: &str) -> Vec<String> {
	let mut analyzer = build_analyzer();
	let mut stream = analyzer.token_stream(text);
	let mut terms: Vec<String> = Vec::new();
	while stream.advance() {
		let t = &stream.token().text;
		if !terms.iter().any(|seen| seen == t) { terms.push(t.clone()); }
	}
	terms
}
