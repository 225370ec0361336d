mod common;

use common::{failure, output, run};

#[test]
fn test_name_error() {
    let failure = failure("inexistente\n");
    assert_eq!(failure.kind, "NameError");
    assert!(failure.message.contains("inexistente"));
}

#[test]
fn test_fault_kinds() {
    assert_eq!(failure("1 + 'a'\n").kind, "TypeError");
    assert_eq!(failure("1 / 0\n").kind, "ZeroDivisionError");
    assert_eq!(failure("[1][9]\n").kind, "IndexError");
    assert_eq!(failure("{'a': 1}['z']\n").kind, "KeyError");
    assert_eq!(failure("''.inexistente\n").kind, "AttributeError");
    assert_eq!(failure("importe modulo_fantasma\n").kind, "ImportError");
    assert_eq!(failure("inteiro = int('abc')\n").kind, "ValueError");
}

#[test]
fn test_trace_is_rendered_into_stderr() {
    let execution = run("mostre(desconhecido)\n");
    assert!(execution.stderr.contains("NameError"));
    assert!(execution.stderr.contains("desconhecido"));
    assert!(execution.stderr.contains("<teste>"));
}

#[test]
fn test_try_except_catches_matching_kind() {
    let source = "\
tente:
    1 / 0
exceto ZeroDivisionError:
    mostre('dividiu por zero')
";
    assert_eq!(output(source), "dividiu por zero\n");
}

#[test]
fn test_bare_except_catches_everything() {
    let source = "\
tente:
    desconhecido
exceto:
    mostre('pego')
";
    assert_eq!(output(source), "pego\n");
}

#[test]
fn test_exception_name_catches_everything() {
    let source = "\
tente:
    1 / 0
exceto Exception:
    mostre('pego')
";
    assert_eq!(output(source), "pego\n");
}

#[test]
fn test_non_matching_handler_propagates() {
    let source = "\
tente:
    1 / 0
exceto TypeError:
    mostre('errado')
";
    assert_eq!(failure(source).kind, "ZeroDivisionError");
}

#[test]
fn test_as_binds_the_fault_message() {
    let source = "\
tente:
    1 / 0
exceto ZeroDivisionError como erro:
    mostre(erro)
";
    assert_eq!(output(source), "division by zero\n");
}

#[test]
fn test_finally_always_runs() {
    let ok = "\
tente:
    mostre('corpo')
finalmente:
    mostre('limpeza')
";
    assert_eq!(output(ok), "corpo\nlimpeza\n");

    let failing = "\
tente:
    1 / 0
exceto ZeroDivisionError:
    mostre('pego')
finalmente:
    mostre('limpeza')
";
    assert_eq!(output(failing), "pego\nlimpeza\n");

    let unhandled = run(
        "\
tente:
    1 / 0
finalmente:
    mostre('limpeza')
",
    );
    assert_eq!(unhandled.stdout, "limpeza\n");
    assert_eq!(unhandled.failure.unwrap().kind, "ZeroDivisionError");
}

#[test]
fn test_raise_with_value() {
    let failure = failure("lance 'deu ruim'\n");
    assert_eq!(failure.kind, "Exception");
    assert_eq!(failure.message, "deu ruim");
}

#[test]
fn test_raised_fault_is_catchable() {
    let source = "\
tente:
    lance 'problema'
exceto Exception como erro:
    mostre('pego:', erro)
";
    assert_eq!(output(source), "pego: problema\n");
}

#[test]
fn test_bare_raise_rethrows_inside_handler() {
    let source = "\
tente:
    tente:
        1 / 0
    exceto ZeroDivisionError:
        lance
exceto ZeroDivisionError:
    mostre('de novo')
";
    assert_eq!(output(source), "de novo\n");
}

#[test]
fn test_assert_passes_and_fails() {
    assert_eq!(output("afirme 1 < 2\nmostre('ok')\n"), "ok\n");
    let failure = failure("afirme 1 > 2, 'esperava maior'\n");
    assert_eq!(failure.kind, "AssertionError");
    assert_eq!(failure.message, "esperava maior");
}

#[test]
fn test_exit_is_not_caught_by_handlers() {
    let mut session = prosa::session::Session::new();
    let source = "\
tente:
    sair(5)
exceto:
    mostre('nunca')
";
    let result = session.execute(source, "<teste>");
    assert_eq!(result.unwrap_err().code, 5);
}

#[test]
fn test_fault_inside_function_carries_its_kind() {
    let source = "\
funcao quebra():
    retorne [1][7]
quebra()
";
    assert_eq!(failure(source).kind, "IndexError");
}
