//! Integration tests for the cl100k_base encoding (GPT-4, GPT-3.5-turbo).
//!
//! These read `cl100k_base.tiktoken` from the vocabulary cache directory
//! (`TIKTOKEN_CACHE_DIR`, `DATA_GYM_CACHE_DIR`, or `<tmp>/data-gym-cache`)
//! and return early when it is not there.

use rankbpe::registry::{get_encoding_in, VocabDir};
use rankbpe::{encoding_name_for_model, Tokenizer, TokenizerError};

/// Test basic encoding and decoding roundtrip.
#[test]
fn test_cl100k_encode_decode_roundtrip() {
    let Some(tokenizer) = create_cl100k_tokenizer() else {
        return;
    };

    let test_cases = vec![
        "Hello, world!",
        "The quick brown fox jumps over the lazy dog.",
        "1234567890",
        "Special characters: !@#$%^&*()",
        "Multi-line\ntext\nwith\nnewlines",
        "Unicode: こんにちは 世界 🦀",
    ];

    for text in test_cases {
        let tokens = tokenizer.encode(text).unwrap();
        let decoded = tokenizer.decode(&tokens).unwrap();
        assert_eq!(decoded, text, "Roundtrip failed for: {:?}", text);
    }
}

/// Known token ids.
#[test]
fn test_cl100k_reference_tokens() {
    let Some(tokenizer) = create_cl100k_tokenizer() else {
        return;
    };

    assert_eq!(tokenizer.encode("hello world").unwrap(), vec![15339, 1917]);
    assert_eq!(
        tokenizer.encode("Hello, world!").unwrap(),
        vec![9906, 11, 1917, 0]
    );
    assert_eq!(tokenizer.n_vocab(), 100277);
    assert_eq!(tokenizer.eot_token(), Some(100257));
}

#[test]
fn test_cl100k_special_tokens() {
    let Some(tokenizer) = create_cl100k_tokenizer() else {
        return;
    };

    let tokens = tokenizer.encode_with_special("Hello<|endoftext|>World").unwrap();
    assert!(tokens.contains(&100257), "Should contain endoftext (100257)");

    let fim = "<|fim_prefix|>def hello():\n    <|fim_suffix|>\n    return result<|fim_middle|>";
    let tokens = tokenizer.encode_with_special(fim).unwrap();
    assert!(tokens.contains(&100258));
    assert!(tokens.contains(&100259));
    assert!(tokens.contains(&100260));
    assert_eq!(tokenizer.decode(&tokens).unwrap(), fim);

    assert!(matches!(
        tokenizer.encode("<|endofprompt|>"),
        Err(TokenizerError::DisallowedSpecial(_))
    ));
    assert_eq!(tokenizer.decode(&[100276]).unwrap(), "<|endofprompt|>");
}

/// "SwissAir" and "Vincenzo Timmel" under dropout 0 and 1, as text and bytes.
#[test]
fn test_cl100k_dropout_scenarios() {
    let Some(tokenizer) = create_cl100k_tokenizer() else {
        return;
    };

    for text in ["SwissAir", "Vincenzo Timmel"] {
        let default = tokenizer.encode(text).unwrap();
        assert_eq!(tokenizer.encode_with_dropout(text, 0.0).unwrap(), default);

        let first = tokenizer.encode_with_dropout(text, 1.0).unwrap();
        let second = tokenizer.encode_with_dropout(text, 1.0).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), text.len());
        assert_ne!(first, default);

        let data = text.as_bytes();
        let default_bytes = tokenizer.encode_bytes(data, 0.0).unwrap();
        assert_eq!(default_bytes, default);
        let first = tokenizer.encode_bytes(data, 1.0).unwrap();
        assert_eq!(first, tokenizer.encode_bytes(data, 1.0).unwrap());
        assert_ne!(first, default_bytes);
    }
}

/// Test batch encoding.
#[test]
fn test_cl100k_batch_encode() {
    let Some(tokenizer) = create_cl100k_tokenizer() else {
        return;
    };

    let texts = vec![
        "Hello, world!".to_string(),
        "How are you?".to_string(),
        "I'm doing great!".to_string(),
    ];

    let batch_tokens = tokenizer.encode_ordinary_batch(&texts).unwrap();
    assert_eq!(batch_tokens.len(), 3);

    for (i, text) in texts.iter().enumerate() {
        let individual = tokenizer.encode_ordinary(text).unwrap();
        assert_eq!(
            batch_tokens[i], individual,
            "Batch encoding should match individual encoding for text {}: {:?}",
            i, text
        );
    }
}

/// Test code content, which exercises the whitespace rules of the pattern.
#[test]
fn test_cl100k_code_content() {
    let Some(tokenizer) = create_cl100k_tokenizer() else {
        return;
    };

    let code = r#"
def hello_world():
    print("Hello, World!")

if __name__ == "__main__":
    hello_world()
"#;

    let tokens = tokenizer.encode(code).unwrap();
    assert_eq!(tokenizer.decode(&tokens).unwrap(), code);
}

#[test]
fn test_cl100k_model_lookup() {
    assert_eq!(encoding_name_for_model("gpt-4").unwrap(), "cl100k_base");
    assert_eq!(
        encoding_name_for_model("gpt-3.5-turbo-0301").unwrap(),
        "cl100k_base"
    );
}

// Helper to load cl100k_base from the cache directory, if present
fn create_cl100k_tokenizer() -> Option<Tokenizer> {
    let dir = VocabDir::from_env();
    if !dir.path().join("cl100k_base.tiktoken").exists() {
        eprintln!(
            "cl100k_base.tiktoken not found in {}; skipping",
            dir.path().display()
        );
        return None;
    }
    Some(get_encoding_in("cl100k_base", &dir).unwrap())
}
