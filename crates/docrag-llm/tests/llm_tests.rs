use docrag_core::config::{LlmProvider, Settings, Variant};
use docrag_llm::{build_model, GenerationParams, LlmError};

#[test]
fn open_source_preset_maps_to_sampling_parameters() {
    let llm = Settings::preset(Variant::OpenSource).llm;
    assert_eq!(llm.provider, LlmProvider::HuggingFace);
    let params = GenerationParams::from(&llm);
    assert_eq!(params, GenerationParams { temperature: 0.7, max_length: 512, top_p: 0.95, do_sample: true });
}

#[test]
fn missing_token_is_reported_by_name() {
    let llm = Settings::preset(Variant::OpenSource).llm;
    std::env::remove_var("HUGGINGFACE_API_TOKEN");

    let err = build_model(&llm).err().expect("no token");
    let llm_err = err.downcast_ref::<LlmError>().expect("typed error");
    assert!(matches!(llm_err, LlmError::MissingApiKey { env_var: "HUGGINGFACE_API_TOKEN" }));
    assert!(err.to_string().contains("HUGGINGFACE_API_TOKEN"));
}

#[test]
fn configured_key_builds_named_model() {
    let llm = Settings::preset(Variant::OpenAi).llm;
    std::env::set_var("OPENAI_API_KEY", "sk-test");
    let model = build_model(&llm).expect("model");
    assert_eq!(model.model_name(), "gpt-3.5-turbo");
}
