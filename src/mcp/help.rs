//! Static help resource.

/// Address of the help resource.
pub const HELP_URI: &str = "search://help";

/// Display name of the help resource.
pub const HELP_NAME: &str = "Document search help";

/// Help text listing every tool with a one-line description.
pub const HELP_TEXT: &str = "\
Document Search Server

Available tools:
  - search_documents(query, collection=\"default\", max_results=5)
      Semantic search over a collection; returns ranked excerpts with relevance scores.
  - list_collections()
      Lists every collection with its document count.
  - add_document(document_name, content, collection=\"documents\", metadata={})
      Adds one document; an id that already exists is rejected.
  - add_documents_batch(documents, collection=\"documents\")
      Adds several documents at once; any duplicate id rejects the whole batch.
  - get_document(document_name, collection=\"documents\")
      Returns one document with its full content and metadata.
  - delete_document(document_name, collection=\"documents\")
      Removes one document.

Relevance is derived from vector distance as 1 - distance / 2, clamped to 0..1.
Excerpts longer than 300 characters are truncated with \"...\".
";
