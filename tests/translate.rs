use prosa::translate::{normalize, Translator};

fn translate(source: &str) -> String {
    Translator::new().translate(source)
}

#[test]
fn test_accented_and_plain_spellings_normalize_alike() {
    for (accented, plain) in [
        ("não", "nao"),
        ("função", "funcao"),
        ("senão", "senao"),
        ("SENÃO", "senao"),
    ] {
        assert_eq!(normalize(accented), plain);
    }
}

#[test]
fn test_normalize_is_idempotent() {
    for word in ["Função", "senãose", "VERDADEIRO", "abc123"] {
        assert_eq!(normalize(&normalize(word)), normalize(word));
    }
}

#[test]
fn test_accented_spellings_translate_identically() {
    assert_eq!(
        translate("nao verdadeiro\n"),
        translate("não verdadeiro\n")
    );
    assert_eq!(
        translate("funcao f(x): retorne x\n"),
        translate("função f(x): retorne x\n")
    );
}

#[test]
fn test_keyword_rewrites() {
    assert_eq!(
        translate("se verdadeiro: passe\nsenao: passe\n"),
        "if True: pass\nelse: pass\n"
    );
    assert_eq!(
        translate("para i em intervalo(3): mostre(i)\n"),
        "for i in intervalo(3): mostre(i)\n"
    );
    assert_eq!(
        translate("tente: passe\nexceto: passe\nfinalmente: passe\n"),
        "try: pass\nexcept: pass\nfinally: pass\n"
    );
}

#[test]
fn test_literal_containing_keyword_text_is_untouched() {
    // A string equal to the translated word for "if" passes through.
    assert_eq!(translate("x = 'if'\n"), "x = 'if'\n");
    assert_eq!(translate("x = 'se'\n"), "x = 'se'\n");
    assert_eq!(
        translate("mostre(\"enquanto verdadeiro\")\n"),
        "mostre(\"enquanto verdadeiro\")\n"
    );
}

#[test]
fn test_host_keywords_in_source_pass_through() {
    // Identity overlaps: these localized words are already host keywords.
    assert_eq!(translate("continue\n"), "continue\n");
    assert_eq!(translate("global x\n"), "global x\n");
    assert_eq!(translate("lambda x: x\n"), "lambda x: x\n");
}

#[test]
fn test_lookahead_merge_collapses_to_elif() {
    assert_eq!(
        translate("se a: passe\nsenao se b: passe\n"),
        "if a: pass\nelif b: pass\n"
    );
    assert_eq!(
        translate("se a: passe\nsenão se b: passe\n"),
        "if a: pass\nelif b: pass\n"
    );
}

#[test]
fn test_senao_not_followed_by_se_never_merges() {
    assert_eq!(translate("senao: passe\n"), "else: pass\n");
    assert_eq!(translate("senao seguro\n"), "else seguro\n");
}

#[test]
fn test_merge_does_not_cross_lines() {
    // A newline between the two words keeps them separate tokens.
    assert_eq!(translate("senao\nse x: passe\n"), "else\nif x: pass\n");
}

#[test]
fn test_empty_input_translates_to_empty_output() {
    assert_eq!(translate(""), "");
}

#[test]
fn test_untokenizable_input_is_returned_unchanged() {
    let broken = "mostre('aberto\n";
    assert_eq!(translate(broken), broken);
}

#[test]
fn test_comments_and_spacing_survive() {
    assert_eq!(
        translate("se x:  # verifica\n    retorne 1\n"),
        "if x:  # verifica\n    retorne 1\n"
    );
}

#[test]
fn test_user_names_are_not_rewritten() {
    assert_eq!(translate("separar = 1\n"), "separar = 1\n");
    assert_eq!(translate("dobro = 2\n"), "dobro = 2\n");
    // Alias names resolve through the namespace, not the translator.
    assert_eq!(translate("mostre(tamanho('ab'))\n"), "mostre(tamanho('ab'))\n");
}
