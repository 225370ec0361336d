mod common;

use common::output;

#[test]
fn test_if_elif_else() {
    let source = "\
x = 15
se x < 10:
    mostre('baixo')
senao se x < 20:
    mostre('medio')
senao:
    mostre('alto')
";
    assert_eq!(output(source), "medio\n");
}

#[test]
fn test_merged_elif_spelling() {
    let source = "\
x = 25
se x < 10:
    mostre('baixo')
senaose x < 20:
    mostre('medio')
senao:
    mostre('alto')
";
    assert_eq!(output(source), "alto\n");
}

#[test]
fn test_while_loop() {
    let source = "\
x = 0
enquanto x < 5:
    x += 1
mostre(x)
";
    assert_eq!(output(source), "5\n");
}

#[test]
fn test_while_false_never_runs() {
    let source = "\
x = 10
enquanto x < 5:
    x += 1
mostre(x)
";
    assert_eq!(output(source), "10\n");
}

#[test]
fn test_break_leaves_loop() {
    let source = "\
x = 0
enquanto verdadeiro:
    x += 1
    se x >= 3:
        pare
mostre(x)
";
    assert_eq!(output(source), "3\n");
}

#[test]
fn test_continue_skips_iteration() {
    let source = "\
total = 0
para i em intervalo(10):
    se i % 2 == 0:
        continue
    total += i
mostre(total)
";
    assert_eq!(output(source), "25\n");
}

#[test]
fn test_for_over_range() {
    assert_eq!(output("para i em intervalo(3): mostre(i)\n"), "0\n1\n2\n");
}

#[test]
fn test_for_over_list_and_string() {
    assert_eq!(output("para x em [10, 20]: mostre(x)\n"), "10\n20\n");
    assert_eq!(output("para c em 'ab': mostre(c)\n"), "a\nb\n");
}

#[test]
fn test_for_over_dict_iterates_keys() {
    assert_eq!(
        output("para k em {'a': 1, 'b': 2}: mostre(k)\n"),
        "a\nb\n"
    );
}

#[test]
fn test_nested_loops_with_break() {
    let source = "\
pares = 0
para i em intervalo(3):
    para j em intervalo(3):
        se j > i:
            pare
        pares += 1
mostre(pares)
";
    assert_eq!(output(source), "6\n");
}

#[test]
fn test_loop_body_scope_is_shared() {
    // No block scoping: names bound inside a suite stay visible after it.
    let source = "\
se verdadeiro:
    y = 9
mostre(y)
";
    assert_eq!(output(source), "9\n");
}

#[test]
fn test_with_binds_and_runs_body() {
    let source = "\
com [1, 2] como par:
    mostre(tamanho(par))
";
    assert_eq!(output(source), "2\n");
}

#[test]
fn test_semicolon_separated_statements() {
    assert_eq!(output("x = 1; y = 2; mostre(x + y)\n"), "3\n");
}
